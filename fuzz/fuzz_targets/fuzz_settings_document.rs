#![no_main]

use std::path::Path;

use docklift::SettingsDocument;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Fuzz application document parsing and validation - this should never panic
        if let Ok((document, _warnings)) =
            SettingsDocument::parse_with_warnings(content, Path::new("docklift.yml"))
        {
            let _ = docklift::config::validate(&document, Path::new("/nonexistent"));
        }
    }
});
