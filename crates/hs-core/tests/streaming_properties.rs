//! Property-based tests for the streaming classifier invariants.

use hs_core::{
    BatchClassifier, Decision, DiscreteHmm, MarkovClassifier, RunningForward,
    RunningMarkovClassifier, SequenceClassifier,
};
use proptest::prelude::*;
use std::sync::Arc;

fn close(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn normalize(mut weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= total;
    }
    weights
}

fn row(len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.05f64..1.0, len).prop_map(normalize)
}

type Tables = (Vec<f64>, Vec<Vec<f64>>, Vec<Vec<f64>>);

fn tables(states: usize, symbols: usize) -> impl Strategy<Value = Tables> {
    (
        row(states),
        prop::collection::vec(row(states), states),
        prop::collection::vec(row(symbols), states),
    )
}

fn hmm(states: usize, symbols: usize) -> impl Strategy<Value = DiscreteHmm> {
    tables(states, symbols).prop_map(|(initial, transitions, emissions)| {
        DiscreteHmm::new(initial, transitions, emissions).expect("normalized tables")
    })
}

/// Two uniform-prior classes holding the same chain under different state labels.
fn relabelled_twins() -> impl Strategy<Value = (MarkovClassifier, Vec<usize>)> {
    (2usize..6, 2usize..5)
        .prop_flat_map(|(states, symbols)| {
            (
                tables(states, symbols),
                Just((0..states).collect::<Vec<_>>()).prop_shuffle(),
                prop::collection::vec(0..symbols, 1..40),
            )
        })
        .prop_map(|((initial, transitions, emissions), order, sequence)| {
            let relabelled = DiscreteHmm::new(
                order.iter().map(|&k| initial[k]).collect(),
                order
                    .iter()
                    .map(|&k| order.iter().map(|&l| transitions[k][l]).collect())
                    .collect(),
                order.iter().map(|&k| emissions[k].clone()).collect(),
            )
            .expect("normalized tables");
            let original =
                DiscreteHmm::new(initial, transitions, emissions).expect("normalized tables");
            let classifier =
                MarkovClassifier::uniform(vec![Arc::new(original), Arc::new(relabelled)])
                    .expect("valid classifier");
            (classifier, sequence)
        })
}

/// A classifier, an in-alphabet sequence, and the alphabet size.
fn scenario() -> impl Strategy<Value = (MarkovClassifier, Vec<usize>, usize)> {
    (1usize..4, 2usize..5, 1usize..4)
        .prop_flat_map(|(states, symbols, classes)| {
            (
                prop::collection::vec(hmm(states, symbols), classes),
                row(classes),
                prop::option::of((hmm(states, symbols), 0.1f64..2.0)),
                prop::collection::vec(0..symbols, 0..40),
                Just(symbols),
            )
        })
        .prop_map(|(models, priors, threshold, sequence, symbols)| {
            let models: Vec<_> = models.into_iter().map(Arc::new).collect();
            let classifier = MarkovClassifier::new(models, priors).expect("valid classifier");
            let classifier = match threshold {
                Some((model, sensitivity)) => classifier
                    .with_threshold(Arc::new(model), sensitivity)
                    .expect("positive sensitivity"),
                None => classifier,
            };
            (classifier, sequence, symbols)
        })
}

type Snapshot = (Vec<Vec<f64>>, Vec<f64>, Option<f64>, Decision, usize);

fn snapshot(r: &RunningMarkovClassifier) -> Snapshot {
    (
        r.statistics().iter().map(|s| s.alpha().to_vec()).collect(),
        r.responses().to_vec(),
        r.threshold_score(),
        r.decision(),
        r.observations(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn peek_predicts_push((classifier, sequence, _symbols) in scenario()) {
        let mut running = classifier.running();
        for &o in &sequence {
            let predicted = running.peek(o).unwrap();
            running.push(o).unwrap();
            prop_assert_eq!(predicted.decision, running.decision());
            prop_assert_eq!(
                predicted.log_likelihood.to_bits(),
                running.log_likelihood().to_bits()
            );
        }
    }

    #[test]
    fn peek_predicts_push_between_relabelled_twins((classifier, sequence) in relabelled_twins()) {
        let mut running = classifier.running();
        for &o in &sequence {
            let predicted = running.peek(o).unwrap();
            running.push(o).unwrap();
            prop_assert_eq!(
                predicted.decision,
                running.decision(),
                "responses {:?}",
                running.responses()
            );
        }
    }

    #[test]
    fn peek_never_mutates((classifier, sequence, symbols) in scenario()) {
        let mut running = classifier.running();
        running.push_all(&sequence).unwrap();
        let before = snapshot(&running);
        for o in 0..symbols {
            running.peek(o).unwrap();
        }
        prop_assert!(running.peek(symbols).is_err());
        prop_assert_eq!(snapshot(&running), before);
    }

    #[test]
    fn clear_restores_fresh_state((classifier, sequence, _symbols) in scenario()) {
        let fresh = snapshot(&classifier.running());
        let mut running = classifier.running();
        running.push_all(&sequence).unwrap();
        running.clear();
        let once = snapshot(&running);
        running.clear();
        prop_assert_eq!(snapshot(&running), once.clone());
        prop_assert_eq!(once, fresh);
        prop_assert_eq!(running.decision(), Decision::Reject);
    }

    #[test]
    fn rejected_symbol_changes_nothing(
        (classifier, sequence, symbols) in scenario(),
        excess in 0usize..10,
    ) {
        let mut running = classifier.running();
        running.push_all(&sequence).unwrap();
        let before = snapshot(&running);
        prop_assert!(running.push(symbols + excess).is_err());
        prop_assert_eq!(snapshot(&running), before);
    }

    #[test]
    fn running_forward_matches_batch((classifier, sequence, _symbols) in scenario()) {
        for model in classifier.models() {
            let mut stat = RunningForward::new(Arc::clone(model));
            for &o in &sequence {
                stat.push(o).unwrap();
            }
            let batch = model.log_likelihood(&sequence).unwrap();
            prop_assert!(close(stat.log_forward(), batch), "{} vs {}", stat.log_forward(), batch);
        }
    }

    #[test]
    fn batch_classify_matches_streaming((classifier, sequence, _symbols) in scenario()) {
        let mut running = classifier.running();
        running.push_all(&sequence).unwrap();
        let single = classifier.classify(&sequence).unwrap();
        prop_assert_eq!(single.decision, running.decision());
        prop_assert!(close(single.log_likelihood, running.log_likelihood()));

        let batch = classifier.classify_all(&[sequence.clone(), sequence]).unwrap();
        prop_assert_eq!(batch[0], single);
        prop_assert_eq!(batch[1], single);
    }

    #[test]
    fn probabilities_form_simplex((classifier, sequence, _symbols) in scenario()) {
        let mut running = classifier.running();
        running.push_all(&sequence).unwrap();
        let slots = running.classes() + usize::from(running.has_threshold());
        let mut out = vec![0.0; slots];
        running.probabilities(&mut out).unwrap();
        let total: f64 = out.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(out.iter().all(|p| (0.0..=1.0).contains(p)));
    }
}

#[test]
fn identical_classes_tie_to_lowest_index() {
    let model = Arc::new(
        DiscreteHmm::new(
            vec![0.3, 0.7],
            vec![vec![0.6, 0.4], vec![0.25, 0.75]],
            vec![vec![0.5, 0.2, 0.3], vec![0.1, 0.1, 0.8]],
        )
        .unwrap(),
    );
    let classifier = MarkovClassifier::uniform(vec![model.clone(), model.clone(), model]).unwrap();
    let mut running = classifier.running();
    for o in [0, 2, 2, 1, 0, 2, 1, 1] {
        running.push(o).unwrap();
        assert_eq!(running.decision(), Decision::Class(0));
    }
}
