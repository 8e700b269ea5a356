//! Fuzz target for model-set parsing and classifier construction.
//!
//! Any input must either be rejected with an error or yield a classifier
//! that can run a short stream without panicking.

#![no_main]

use hs_config::{validate_model_set, ModelSet};
use hs_core::MarkovClassifier;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let parsed = ModelSet::from_json_str(text).or_else(|_| ModelSet::from_toml_str(text));
    let Ok(set) = parsed else {
        return;
    };
    if validate_model_set(&set).is_err() {
        return;
    }
    let classifier = MarkovClassifier::from_model_set(&set)
        .expect("validated model set must build a classifier");

    let mut running = classifier.running();
    for symbol in 0..set.alphabet().min(16) {
        let _ = running.peek(symbol);
        let _ = running.push(symbol);
    }
});
