//! Label parsing and the `#label` name encoding

use std::collections::BTreeSet;

/// A sorted, duplicate-free set of labels
pub type LabelSet = BTreeSet<String>;

/// Parse a comma separated label list
///
/// Entries are whitespace-trimmed, empty entries are ignored and duplicates
/// collapse. An empty or blank input yields an empty set.
pub fn parse_label_list(csv: &str) -> LabelSet {
    csv.split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `#label` tokens out of a display name
///
/// Only whitespace separated tokens of at least two characters starting with
/// `#` count as labels. Every label token is removed from the name and the
/// remaining words are re-joined with single spaces.
pub fn extract_name_labels(name: &str) -> (String, LabelSet) {
    let mut labels = LabelSet::new();
    let mut words = Vec::new();
    for token in name.split_whitespace() {
        match token.strip_prefix('#') {
            Some(label) if !label.is_empty() => {
                labels.insert(label.to_string());
            }
            _ => words.push(token),
        }
    }
    (words.join(" "), labels)
}

/// Append labels to a name as ` #label` suffixes
pub fn name_with_labels(name: &str, labels: &LabelSet) -> String {
    let mut out = name.to_string();
    for label in labels {
        out.push_str(" #");
        out.push_str(label);
    }
    out
}

/// `#a #b` rendering used in popups
pub fn display_labels<'a>(labels: impl IntoIterator<Item = &'a String>) -> String {
    labels
        .into_iter()
        .map(|l| format!("#{l}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A label set matches a filter iff it carries every filter label
#[inline]
pub fn matches_filter(labels: &LabelSet, filter: &LabelSet) -> bool {
    filter.iter().all(|l| labels.contains(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> LabelSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_label_list() {
        assert_eq!(parse_label_list(" b, a ,b"), set(&["a", "b"]));
        assert!(parse_label_list("").is_empty());
        assert!(parse_label_list(" , ,").is_empty());
    }

    #[test]
    fn test_extract_name_labels() {
        let (name, labels) = extract_name_labels("Ridge loop #primary #2023 #primary");
        assert_eq!(name, "Ridge loop");
        assert_eq!(labels, set(&["2023", "primary"]));
    }

    #[test]
    fn test_extract_ignores_bare_hash() {
        let (name, labels) = extract_name_labels("Camp # 4 #x");
        assert_eq!(name, "Camp # 4");
        assert_eq!(labels, set(&["x"]));
    }

    #[test]
    fn test_extract_without_labels_keeps_name() {
        let (name, labels) = extract_name_labels("Plain name");
        assert_eq!(name, "Plain name");
        assert!(labels.is_empty());
    }

    #[test]
    fn test_name_with_labels_round_trip() {
        let labels = set(&["b", "a"]);
        let encoded = name_with_labels("Creek", &labels);
        assert_eq!(encoded, "Creek #a #b");
        assert_eq!(extract_name_labels(&encoded), ("Creek".to_string(), labels));
    }

    #[test]
    fn test_matches_filter() {
        let labels = set(&["a", "b"]);
        assert!(matches_filter(&labels, &LabelSet::new()));
        assert!(matches_filter(&labels, &set(&["a"])));
        assert!(!matches_filter(&labels, &set(&["a", "c"])));
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(display_labels(&set(&["x", "y"])), "#x #y");
        assert_eq!(display_labels(&LabelSet::new()), "");
    }
}
