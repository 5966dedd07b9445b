//! Request key derivation.
//!
//! A [`RequestKey`] is the de-duplication identity of a
//! [`GenerationRequest`]: equal requests always produce equal keys and
//! distinct requests never collide.
//!
//! ## Layout
//!
//! ```text
//! <engagement>::<tone>::<n>#<win>|<win>::<n>#<risk>::<n>#<roadmap>|<roadmap>
//! ```
//!
//! Every free-text value has `\`, `|`, `:` and `#` backslash-escaped, so
//! separators inside user input cannot be confused with real separators.
//! Each list carries its length so `[]` and `[""]` stay distinct.
//!
//! Keys are never persisted; the layout may change between releases.

use crate::model::GenerationRequest;

const FIELD_SEPARATOR: &str = "::";
const ITEM_SEPARATOR: char = '|';
const LENGTH_MARKER: char = '#';

/// Deterministic identity of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the request key for a request.
///
/// Pure: no I/O, no normalization. Callers that want whitespace-insensitive
/// keys hash [`GenerationRequest::normalized`] instead.
///
/// ## Example
///
/// ```
/// use blueprint_core::key::build_key;
/// use blueprint_core::model::GenerationRequest;
///
/// let request = GenerationRequest::new("acme-1")
///     .with_tone("Bold")
///     .with_wins(["fast POV"])
///     .with_roadmap(["phase 2"]);
///
/// assert_eq!(
///     build_key(&request).as_str(),
///     "acme-1::Bold::1#fast POV::0#::1#phase 2"
/// );
/// ```
pub fn build_key(request: &GenerationRequest) -> RequestKey {
    let mut key = String::new();
    push_escaped(&mut key, &request.engagement_id);
    key.push_str(FIELD_SEPARATOR);
    push_escaped(&mut key, &request.executive_tone);
    for list in [
        &request.emphasis.wins,
        &request.emphasis.risks,
        &request.emphasis.roadmap,
    ] {
        key.push_str(FIELD_SEPARATOR);
        push_list(&mut key, list);
    }
    RequestKey(key)
}

fn push_list(key: &mut String, items: &[String]) {
    key.push_str(&items.len().to_string());
    key.push(LENGTH_MARKER);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            key.push(ITEM_SEPARATOR);
        }
        push_escaped(key, item);
    }
}

fn push_escaped(key: &mut String, value: &str) {
    for c in value.chars() {
        if matches!(c, '\\' | '|' | ':' | '#') {
            key.push('\\');
        }
        key.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Emphasis;
    use proptest::prelude::*;

    #[test]
    fn test_equal_requests_equal_keys() {
        let a = GenerationRequest::new("acme-1").with_wins(["x", "y"]);
        let b = GenerationRequest::new("acme-1").with_wins(["x", "y"]);
        assert_eq!(build_key(&a), build_key(&b));
    }

    #[test]
    fn test_order_of_items_matters() {
        let a = GenerationRequest::new("acme-1").with_wins(["x", "y"]);
        let b = GenerationRequest::new("acme-1").with_wins(["y", "x"]);
        assert_ne!(build_key(&a), build_key(&b));
    }

    #[test]
    fn test_separator_in_input_does_not_collide() {
        // Unescaped, both would read "a::b::..."
        let a = GenerationRequest::new("a::b").with_tone("c");
        let b = GenerationRequest::new("a").with_tone("b::c");
        assert_ne!(build_key(&a), build_key(&b));

        let a = GenerationRequest::new("e").with_wins(["x|y"]);
        let b = GenerationRequest::new("e").with_wins(["x", "y"]);
        assert_ne!(build_key(&a), build_key(&b));
    }

    #[test]
    fn test_empty_list_differs_from_list_with_empty_item() {
        let a = GenerationRequest::new("e").with_risks(Vec::<String>::new());
        let b = GenerationRequest::new("e").with_risks([""]);
        assert_ne!(build_key(&a), build_key(&b));
    }

    #[test]
    fn test_item_moved_between_lists_differs() {
        let a = GenerationRequest::new("e").with_emphasis(Emphasis::new(
            vec!["x".into()],
            vec![],
            vec![],
        ));
        let b = GenerationRequest::new("e").with_emphasis(Emphasis::new(
            vec![],
            vec!["x".into()],
            vec![],
        ));
        assert_ne!(build_key(&a), build_key(&b));
    }

    fn text() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[a-c:|#\\\\ ]{0,6}").unwrap()
    }

    fn request() -> impl Strategy<Value = GenerationRequest> {
        (
            text(),
            text(),
            proptest::collection::vec(text(), 0..3),
            proptest::collection::vec(text(), 0..3),
            proptest::collection::vec(text(), 0..3),
        )
            .prop_map(|(id, tone, wins, risks, roadmap)| GenerationRequest {
                engagement_id: id,
                executive_tone: tone,
                emphasis: Emphasis::new(wins, risks, roadmap),
            })
    }

    proptest! {
        #[test]
        fn prop_key_is_deterministic(r in request()) {
            prop_assert_eq!(build_key(&r), build_key(&r.clone()));
        }

        #[test]
        fn prop_distinct_requests_distinct_keys(a in request(), b in request()) {
            prop_assert_eq!(a == b, build_key(&a) == build_key(&b));
        }
    }
}
