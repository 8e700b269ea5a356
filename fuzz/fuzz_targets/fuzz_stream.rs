//! Fuzz target for push/peek/clear sequences on a fixed classifier.
//!
//! Checks that out-of-alphabet symbols never mutate state and that peek
//! always predicts the following push.

#![no_main]

use arbitrary::Arbitrary;
use hs_core::{DiscreteHmm, MarkovClassifier};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Debug, Arbitrary)]
enum Op {
    Push(u8),
    Peek(u8),
    Clear,
}

fn classifier() -> MarkovClassifier {
    let class = |emissions: Vec<Vec<f64>>| {
        Arc::new(
            DiscreteHmm::new(
                vec![0.6, 0.4],
                vec![vec![0.7, 0.3], vec![0.2, 0.8]],
                emissions,
            )
            .expect("valid tables"),
        )
    };
    MarkovClassifier::new(
        vec![
            class(vec![vec![0.7, 0.2, 0.1], vec![0.5, 0.4, 0.1]]),
            class(vec![vec![0.1, 0.2, 0.7], vec![0.1, 0.4, 0.5]]),
        ],
        vec![0.4, 0.6],
    )
    .and_then(|c| c.with_threshold(class(vec![vec![0.34, 0.33, 0.33]; 2]), 0.8))
    .expect("valid classifier")
}

fuzz_target!(|ops: Vec<Op>| {
    let classifier = classifier();
    let mut running = classifier.running();

    for op in ops {
        let symbol = |s: u8| usize::from(s % 5);
        match op {
            Op::Push(s) => {
                let before = running.responses().to_vec();
                let predicted = running.peek(symbol(s));
                match running.push(symbol(s)) {
                    Ok(()) => {
                        let predicted = predicted.expect("peek accepts what push accepts");
                        assert_eq!(predicted.decision, running.decision());
                    }
                    Err(_) => {
                        assert!(predicted.is_err());
                        assert_eq!(before, running.responses());
                    }
                }
            }
            Op::Peek(s) => {
                let decision = running.decision();
                let _ = running.peek(symbol(s));
                assert_eq!(decision, running.decision());
            }
            Op::Clear => running.clear(),
        }
    }
});
