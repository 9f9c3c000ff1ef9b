#![no_main]

use funnel_stats::dataset::Dataset;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Parsing and validation must reject bad input without panicking
        let _ = Dataset::from_toml_str(input);
        let _ = Dataset::from_json_str(input);
    }
});
