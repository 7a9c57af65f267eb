//! Property tests for host command quoting.

use proptest::prelude::*;

use docklift::domain::services::commands::quote;

/// Undo POSIX single-quote quoting the way `sh` would read one word.
fn unquote(word: &str) -> Option<String> {
    if !word.starts_with('\'') {
        return Some(word.to_string());
    }
    let mut out = String::new();
    let mut rest = word;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("\\'") {
            out.push('\'');
            rest = after;
            continue;
        }
        let inner = rest.strip_prefix('\'')?;
        let end = inner.find('\'')?;
        out.push_str(&inner[..end]);
        rest = &inner[end + 1..];
    }
    Some(out)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: Quoting round-trips through shell word parsing.
    #[test]
    fn property_quote_round_trips(s in "(?s).{0,64}") {
        prop_assert_eq!(unquote(&quote(&s)), Some(s));
    }

    /// PROPERTY: A quoted word never exposes shell metacharacters unquoted.
    #[test]
    fn property_quoted_word_is_inert(s in "[ ;&|$`()<>*?a-z]{1,32}") {
        let quoted = quote(&s);
        if quoted != s {
            prop_assert!(quoted.starts_with('\'') && quoted.ends_with('\''));
        } else {
            prop_assert!(!s.chars().any(|c| " ;&|$`()<>*?".contains(c)));
        }
    }
}
