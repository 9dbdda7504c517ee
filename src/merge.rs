//! Overlay merge and protected-namespace pruning

use crate::types::FlatEntrySet;
use tracing::debug;

/// Combine two entry sets; `overlay` wins wherever both have a path
///
/// The result keeps `base` order, with overlay-only paths appended in overlay
/// order.
pub fn merge(base: &FlatEntrySet, overlay: &FlatEntrySet) -> FlatEntrySet {
    let mut merged = base.clone();
    merged.extend(overlay.iter().map(|(path, value)| (path.clone(), value.clone())));
    merged
}

/// Drop every entry whose encoded path starts with one of `protected_prefixes`
pub fn prune<S: AsRef<str>>(entries: &FlatEntrySet, protected_prefixes: &[S]) -> FlatEntrySet {
    entries
        .iter()
        .filter(|(path, value)| {
            let encoded = path.encode();
            let protected = protected_prefixes
                .iter()
                .any(|prefix| encoded.starts_with(prefix.as_ref()));
            if protected {
                debug!(field = %encoded, value = ?value, "removed protected field");
            }
            !protected
        })
        .map(|(path, value)| (path.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlatValue;

    fn entries(pairs: &[(&str, &str)]) -> FlatEntrySet {
        pairs
            .iter()
            .map(|(key, value)| (key.parse().unwrap(), FlatValue::from(*value)))
            .collect()
    }

    fn keys(entries: &FlatEntrySet) -> Vec<String> {
        entries.paths().map(|p| p.encode()).collect()
    }

    #[test]
    fn test_overlay_wins() {
        let merged = merge(&entries(&[("title", "Hi")]), &entries(&[("title", "Bonjour")]));
        assert_eq!(merged, entries(&[("title", "Bonjour")]));
    }

    #[test]
    fn test_merge_order_base_then_overlay_only() {
        let base = entries(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let overlay = entries(&[("d", "40"), ("b", "20")]);

        let merged = merge(&base, &overlay);
        assert_eq!(keys(&merged), vec!["a", "b", "c", "d"]);
        assert_eq!(merged.get_encoded("b").unwrap(), Some(&FlatValue::from("20")));
        assert_eq!(merged.get_encoded("a").unwrap(), Some(&FlatValue::from("1")));
    }

    #[test]
    fn test_prune_protected_prefix() {
        let input = entries(&[
            ("meta/_elementor_data/0/id", "from base"),
            ("post_title", "Bonjour"),
            ("meta/_elementor_data_backup", "kept"),
        ]);

        let pruned = prune(&input, &["meta/_elementor_data/"]);
        assert_eq!(keys(&pruned), vec!["post_title", "meta/_elementor_data_backup"]);
    }

    #[test]
    fn test_prune_applies_to_both_sides_after_merge() {
        let base = entries(&[("meta/_elementor_data/x", "a"), ("title", "Hi")]);
        let overlay = entries(&[("meta/_elementor_data/y", "b"), ("title", "Bonjour")]);

        let pruned = prune(&merge(&base, &overlay), &["meta/_elementor_data/"]);
        assert_eq!(pruned, entries(&[("title", "Bonjour")]));
    }

    #[test]
    fn test_prune_without_prefixes_is_identity() {
        let input = entries(&[("a", "1")]);
        assert_eq!(prune::<&str>(&input, &[]), input);
    }
}
