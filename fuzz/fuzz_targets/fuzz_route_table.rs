#![no_main]

use docklift::domain::value_objects::DomainName;
use docklift::RouteTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Parsing should never panic, and whatever parses must render back as-is
        if let Ok(mut table) = RouteTable::parse(content) {
            assert_eq!(table.render(), content);

            let domain = DomainName::parse("fuzz.example.com").unwrap();
            if table.upsert(&domain, "fuzz-app:3000").is_ok() {
                let rendered = table.render();
                let reparsed = RouteTable::parse(&rendered).unwrap();
                assert_eq!(reparsed.upstream(&domain).as_deref(), Some("fuzz-app:3000"));
            }
        }
    }
});
