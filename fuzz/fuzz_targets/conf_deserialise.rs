#![no_main]
use libfuzzer_sys::fuzz_target;

use named_types::conf::types::Config;
use named_types::diagnostics::Diagnostics;

fuzz_target!(|data: &str| {
    let mut diagnostics = Diagnostics::new();
    if let Ok(config) = Config::deserialise(data, &mut diagnostics) {
        assert!(diagnostics.warnings().count() >= config.unknown_keywords().count());
    }
});
