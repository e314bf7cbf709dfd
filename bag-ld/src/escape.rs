//! Échappement des littéraux entre guillemets

use std::borrow::Cow;

/// Précède chaque `"` d'un backslash
///
/// Seul le guillemet est échappé: un backslash déjà présent est recopié tel quel.
pub fn escape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('"') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for (i, run) in raw.split('"').enumerate() {
        if i > 0 {
            out.push_str("\\\"");
        }
        out.push_str(run);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_escape_empty() {
        assert_eq!(escape(""), "");
    }

    #[test]
    fn test_escape_borrows_without_quotes() {
        assert!(matches!(escape("<gml:Point>"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(
            escape(r#"<gml:Point srsName="EPSG:28992">"#),
            r#"<gml:Point srsName=\"EPSG:28992\">"#
        );
        assert_eq!(escape(r#"""#), r#"\""#);
        assert_eq!(escape(r#"a\"b"#), r#"a\\"b"#);
    }

    fn unescape(s: &str) -> String {
        s.replace("\\\"", "\"")
    }

    proptest! {
        #[test]
        fn prop_every_quote_is_escaped(raw in ".*") {
            let escaped = escape(&raw);
            let chars: Vec<char> = escaped.chars().collect();
            for (i, c) in chars.iter().enumerate() {
                if *c == '"' {
                    prop_assert!(i > 0 && chars[i - 1] == '\\');
                }
            }
            prop_assert_eq!(
                escaped.matches('"').count(),
                raw.matches('"').count()
            );
        }

        #[test]
        fn prop_roundtrip(raw in "(?s).*") {
            prop_assert_eq!(unescape(&escape(&raw)), raw);
        }

        #[test]
        fn prop_roundtrip_backslashes(raw in "[\\\\\"a]*") {
            prop_assert_eq!(unescape(&escape(&raw)), raw);
        }

        #[test]
        fn prop_length_bound(raw in ".*") {
            prop_assert!(escape(&raw).len() <= 2 * raw.len());
        }
    }
}
