//! Property tests for the routing document.

use proptest::prelude::*;

use docklift::domain::entities::{RouteChange, RouteTable};
use docklift::domain::value_objects::DomainName;

fn label() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9]{0,8}").unwrap()
}

fn domain() -> impl Strategy<Value = String> {
    (label(), label()).prop_map(|(host, zone)| format!("{}.{}.test", host, zone))
}

fn upstream() -> impl Strategy<Value = String> {
    (label(), 3000u16..3100).prop_map(|(app, port)| format!("{}-app:{}", app, port))
}

/// A document with distinct domains, rendered by hand.
fn document() -> impl Strategy<Value = (Vec<(String, String)>, String)> {
    proptest::collection::btree_map(domain(), upstream(), 0..6).prop_map(|routes| {
        let routes: Vec<(String, String)> = routes.into_iter().collect();
        let mut text = String::from("{\n\temail ops@example.com\n}\n");
        for (domain, upstream) in &routes {
            text.push_str(&format!(
                "\n{} {{\n\treverse_proxy {}\n\tencode gzip\n}}\n",
                domain, upstream
            ));
        }
        (routes, text)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Parsing arbitrary text never panics.
    #[test]
    fn property_parse_never_panics(s in "(?s).{0,512}") {
        let _ = RouteTable::parse(&s);
    }

    /// PROPERTY: A parsed document renders back byte-for-byte.
    #[test]
    fn property_parse_render_is_identity((_, text) in document()) {
        let table = RouteTable::parse(&text).unwrap();
        prop_assert_eq!(table.render(), text);
    }

    /// PROPERTY: Upserting one domain leaves every other site block untouched.
    #[test]
    fn property_upsert_isolates_other_routes(
        (routes, text) in document(),
        target in domain(),
        target_upstream in upstream(),
    ) {
        let mut table = RouteTable::parse(&text).unwrap();
        let name = DomainName::parse(&target).unwrap();
        table.upsert(&name, &target_upstream).unwrap();

        let rendered = table.render();
        let reparsed = RouteTable::parse(&rendered).unwrap();
        prop_assert_eq!(reparsed.upstream(&name), Some(target_upstream.clone()));
        for (domain, upstream) in routes.iter().filter(|(d, _)| *d != target) {
            let other = DomainName::parse(domain).unwrap();
            prop_assert_eq!(reparsed.upstream(&other), Some(upstream.clone()));
            let block = format!("{} {{\n\treverse_proxy {}\n\tencode gzip\n}}", domain, upstream);
            prop_assert!(rendered.contains(&block));
        }
    }

    /// PROPERTY: Applying the same upsert twice changes nothing the second time.
    #[test]
    fn property_upsert_is_idempotent(
        (_, text) in document(),
        target in domain(),
        target_upstream in upstream(),
    ) {
        let mut table = RouteTable::parse(&text).unwrap();
        let name = DomainName::parse(&target).unwrap();
        table.upsert(&name, &target_upstream).unwrap();
        let once = table.render();

        let change = table.upsert(&name, &target_upstream).unwrap();
        prop_assert_eq!(change, RouteChange::Unchanged);
        prop_assert_eq!(table.render(), once);
    }

    /// PROPERTY: Removing a route drops exactly that domain.
    #[test]
    fn property_remove_drops_only_target((routes, text) in document()) {
        prop_assume!(!routes.is_empty());
        let mut table = RouteTable::parse(&text).unwrap();
        let (gone, _) = &routes[0];
        let name = DomainName::parse(gone).unwrap();
        table.remove(&name).unwrap();

        let reparsed = RouteTable::parse(&table.render()).unwrap();
        prop_assert!(!reparsed.contains(&name));
        prop_assert_eq!(reparsed.domains().len(), routes.len() - 1);
    }
}
