//! Priority merges of configuration dictionaries.

use pidsync_diff::clean_configuration;
use pidsync_types::{ConfigurationRecord, InstalledResource};

use crate::schemes::MergeSchemes;

/// Merge `records` so that earlier records take precedence.
///
/// Records are applied from last to first with plain key overwrite, so on
/// overlapping keys the value of the earliest record survives and the key
/// set is the union of all inputs. The inputs are not modified.
pub fn merge_reverse_order(records: &[ConfigurationRecord]) -> ConfigurationRecord {
    let mut merged = ConfigurationRecord::new();
    for record in records.iter().rev() {
        for (key, value) in record.iter() {
            merged.insert(key, value.clone());
        }
    }
    merged
}

/// The dictionary an install writes for a primary resource.
///
/// `siblings` are the other active resources of the primary's group, in
/// priority order. Those whose scheme is in `schemes` and that carry a
/// dictionary contribute properties the primary does not set. Without
/// `schemes`, or without an eligible sibling, the result is the primary's
/// cleaned dictionary.
pub fn effective_install_dictionary<'a>(
    schemes: Option<&MergeSchemes>,
    primary: &ConfigurationRecord,
    siblings: impl IntoIterator<Item = &'a InstalledResource>,
) -> ConfigurationRecord {
    let primary = clean_configuration(primary);
    let Some(schemes) = schemes else {
        return primary;
    };

    let contributions: Vec<ConfigurationRecord> = siblings
        .into_iter()
        .filter(|resource| schemes.contains(&resource.scheme))
        .filter_map(|resource| resource.dictionary.as_ref())
        .map(clean_configuration)
        .collect();

    if contributions.is_empty() {
        return primary;
    }

    let mut ordered = Vec::with_capacity(contributions.len() + 1);
    ordered.push(primary);
    ordered.extend(contributions);
    merge_reverse_order(&ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pidsync_types::{PropertyValue, SERVICE_PID};
    use proptest::prelude::*;

    fn resource(scheme: &str, dictionary: ConfigurationRecord, priority: i32) -> InstalledResource {
        InstalledResource {
            entity_id: "config:p".into(),
            scheme: scheme.into(),
            dictionary: Some(dictionary),
            priority,
        }
    }

    #[test]
    fn first_record_wins_on_overlap() {
        let a = ConfigurationRecord::new().with("x", 1);
        let b = ConfigurationRecord::new().with("x", 2).with("y", 3);
        let merged = merge_reverse_order(&[a, b]);
        assert_eq!(merged, ConfigurationRecord::new().with("x", 1).with("y", 3));
    }

    #[test]
    fn merge_of_one_is_identity() {
        let a = ConfigurationRecord::new().with("x", "v").with("list", vec!["a", "b"]);
        assert_eq!(merge_reverse_order(std::slice::from_ref(&a)), a);
    }

    #[test]
    fn merge_of_none_is_empty() {
        assert!(merge_reverse_order(&[]).is_empty());
    }

    #[test]
    fn merge_does_not_touch_inputs() {
        let a = ConfigurationRecord::new().with("x", 1);
        let b = ConfigurationRecord::new().with("y", 2);
        let inputs = vec![a.clone(), b.clone()];
        merge_reverse_order(&inputs);
        assert_eq!(inputs, vec![a, b]);
    }

    #[test]
    fn eligible_sibling_fills_missing_keys() {
        let schemes = MergeSchemes::new(["merged-scheme"]);
        let primary = ConfigurationRecord::new().with("k", "v");
        let siblings = [resource(
            "merged-scheme",
            ConfigurationRecord::new().with("k", "v2").with("j", "w"),
            1,
        )];
        let effective = effective_install_dictionary(Some(&schemes), &primary, &siblings);
        assert_eq!(effective, ConfigurationRecord::new().with("k", "v").with("j", "w"));
    }

    #[test]
    fn ineligible_siblings_ignored() {
        let schemes = MergeSchemes::new(["merged-scheme"]);
        let primary = ConfigurationRecord::new().with("k", "v");
        let siblings = [resource("other", ConfigurationRecord::new().with("j", "w"), 1)];
        let effective = effective_install_dictionary(Some(&schemes), &primary, &siblings);
        assert_eq!(effective, primary);
    }

    #[test]
    fn no_schemes_returns_cleaned_primary() {
        let primary = ConfigurationRecord::new().with("k", "v").with(SERVICE_PID, "p");
        let siblings = [resource("merged-scheme", ConfigurationRecord::new().with("j", "w"), 1)];
        let effective = effective_install_dictionary(None, &primary, &siblings);
        assert_eq!(effective, ConfigurationRecord::new().with("k", "v"));
    }

    #[test]
    fn sibling_without_dictionary_contributes_nothing() {
        let schemes = MergeSchemes::new(["s"]);
        let primary = ConfigurationRecord::new().with("k", "v");
        let siblings = [InstalledResource {
            entity_id: "config:p".into(),
            scheme: "s".into(),
            dictionary: None,
            priority: 0,
        }];
        assert_eq!(effective_install_dictionary(Some(&schemes), &primary, &siblings), primary);
    }

    fn arb_record() -> impl Strategy<Value = ConfigurationRecord> {
        prop::collection::btree_map("[a-d]", "[a-z]{0,3}", 0..4)
            .prop_map(|m| m.into_iter().map(|(k, v)| (k, PropertyValue::from(v))).collect())
    }

    proptest! {
        #[test]
        fn merge_is_deterministic(records in prop::collection::vec(arb_record(), 0..5)) {
            prop_assert_eq!(merge_reverse_order(&records), merge_reverse_order(&records));
        }

        #[test]
        fn head_values_survive(records in prop::collection::vec(arb_record(), 1..5)) {
            let merged = merge_reverse_order(&records);
            for (key, value) in records[0].iter() {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
    }
}
