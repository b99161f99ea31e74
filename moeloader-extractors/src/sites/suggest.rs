//! Parsing shared by every adapter's autosuggest endpoint.
use moeloader_common::{
    item::SuggestItem,
    log::warn,
    serde::{self, Deserialize},
    serde_json::{self, Value},
};

use crate::lenient;

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct RawSuggestion {
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    name: String,
    #[serde(default, deserialize_with = "lenient::u64_or_zero")]
    count: u64,
}

/// How the remote endpoint orders its completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestOrder {
    /// Already ranked by the site; kept untouched.
    Ranked,
    /// Arbitrary order; sorted by descending count, ties keep their position.
    Unordered,
}

/// Turns a `[{name, count}, ...]` payload into completions.
///
/// A root that isn't a list yields nothing, entries without a name are skipped.
pub fn parse_suggestions(json: Value, order: SuggestOrder) -> Vec<SuggestItem> {
    let Value::Array(entries) = json else {
        warn!("Autosuggest payload is not a list, ignoring it");
        return Vec::new();
    };

    let mut items: Vec<SuggestItem> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawSuggestion>(entry).ok())
        .filter(|raw| !raw.name.trim().is_empty())
        .map(|raw| SuggestItem {
            word: raw.name,
            count: raw.count,
        })
        .collect();

    if order == SuggestOrder::Unordered {
        items.sort_by(|a, b| b.count.cmp(&a.count));
    }

    items
}

#[cfg(test)]
mod test {
    use moeloader_common::serde_json::json;

    use super::{parse_suggestions, SuggestOrder};

    #[test]
    fn ranked_order_is_kept() {
        let json = json!([
            {"name": "long_hair", "count": 10},
            {"name": "", "count": 99},
            {"name": "landscape", "count": "250"},
            "garbage",
            {"name": "lolita", "count": null},
        ]);

        let words: Vec<(String, u64)> = parse_suggestions(json, SuggestOrder::Ranked)
            .into_iter()
            .map(|s| (s.word, s.count))
            .collect();

        assert_eq!(
            words,
            vec![
                ("long_hair".to_string(), 10),
                ("landscape".to_string(), 250),
                ("lolita".to_string(), 0),
            ]
        );
    }

    #[test]
    fn unordered_is_sorted_stably() {
        let json = json!([
            {"name": "a", "count": 1},
            {"name": "b", "count": 5},
            {"name": "c", "count": 1},
        ]);
        let words: Vec<String> = parse_suggestions(json, SuggestOrder::Unordered)
            .into_iter()
            .map(|s| s.word)
            .collect();
        assert_eq!(words, vec!["b", "a", "c"]);
    }

    #[test]
    fn non_list_root_is_empty() {
        assert!(parse_suggestions(json!({"error": "nope"}), SuggestOrder::Ranked).is_empty());
    }
}
