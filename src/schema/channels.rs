//! Channel list parsing and count validation

use crate::error::{EditorError, Result};
use crate::schema::Cardinality;

/// Split free text on whitespace and commas, dropping empty tokens.
///
/// Order and duplicates are preserved: `"a,, b a"` is `["a", "b", "a"]`.
pub fn parse_channel_list(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check a channel count against `min_count` and `max_count`.
///
/// `max_count == -1` never fails the upper bound. `what` names the list in
/// the error message (e.g. "input channels").
pub fn validate_channel_count(
    channels: &[String],
    min_count: i64,
    max_count: i64,
    what: &str,
) -> Result<()> {
    let count = channels.len() as i64;
    if count < min_count {
        return Err(EditorError::TooFew {
            what: what.to_string(),
            min_count,
        });
    }
    if max_count != Cardinality::UNBOUNDED && count > max_count {
        return Err(EditorError::TooMany {
            what: what.to_string(),
            max_count,
        });
    }
    Ok(())
}

/// Parse and validate in one step against a cardinality block
pub fn parse_and_validate(raw: &str, cardinality: &Cardinality, what: &str) -> Result<Vec<String>> {
    let channels = parse_channel_list(raw);
    validate_channel_count(
        &channels,
        cardinality.min_count,
        cardinality.max_count,
        what,
    )?;
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_drops_empty_tokens() {
        assert_eq!(parse_channel_list("a, b,,  c"), list(&["a", "b", "c"]));
        assert_eq!(parse_channel_list("a,, b"), list(&["a", "b"]));
    }

    #[test]
    fn test_parse_keeps_duplicates_and_order() {
        assert_eq!(
            parse_channel_list("click\tbass click\nkeys"),
            list(&["click", "bass", "click", "keys"])
        );
    }

    #[test]
    fn test_parse_blank_input() {
        assert!(parse_channel_list("").is_empty());
        assert!(parse_channel_list(" ,\t, ").is_empty());
    }

    #[test]
    fn test_unbounded_max_never_fails_upper_bound() {
        for min_count in 0..4 {
            for len in min_count..40 {
                let channels: Vec<String> = (0..len).map(|i| format!("ch{}", i)).collect();
                assert!(validate_channel_count(&channels, min_count as i64, -1, "channels").is_ok());
            }
        }
    }

    #[test]
    fn test_too_few() {
        let err = validate_channel_count(&[], 1, 1, "input channels").unwrap_err();
        match err {
            EditorError::TooFew { min_count, .. } => assert_eq!(min_count, 1),
            other => panic!("expected TooFew, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many() {
        let err = validate_channel_count(&list(&["a", "b"]), 1, 1, "output channels").unwrap_err();
        match err {
            EditorError::TooMany { max_count, .. } => assert_eq!(max_count, 1),
            other => panic!("expected TooMany, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_and_validate() {
        let channels = parse_and_validate("main", &Cardinality::single(), "output channels").unwrap();
        assert_eq!(channels, list(&["main"]));
        assert!(parse_and_validate("", &Cardinality::single(), "output channels").is_err());
    }
}
