//! Equivalence of configuration values and records.
//!
//! Values compare by their string coercion: scalars against scalars, and
//! sequences element-wise against sequences of the same length. A scalar
//! never equals a sequence, even a one-element one. Administrative keys are
//! ignored when whole records are compared.

use std::collections::BTreeSet;

use pidsync_types::{is_administrative_key, ConfigurationRecord, PropertyValue};

/// Copy of `record` without administrative keys.
pub fn clean_configuration(record: &ConfigurationRecord) -> ConfigurationRecord {
    record
        .iter()
        .filter(|(key, _)| !is_administrative_key(key))
        .map(|(key, value)| (key, value.clone()))
        .collect()
}

/// Whether two (possibly absent) values are equivalent.
pub fn is_same_value(a: Option<&PropertyValue>, b: Option<&PropertyValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(PropertyValue::Sequence(a)), Some(PropertyValue::Sequence(b))) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.coerce() == y.coerce())
        }
        (Some(PropertyValue::Scalar(a)), Some(PropertyValue::Scalar(b))) => a.coerce() == b.coerce(),
        _ => false,
    }
}

fn configuration_keys(record: &ConfigurationRecord) -> BTreeSet<&str> {
    record.keys().filter(|key| !is_administrative_key(key)).collect()
}

/// Whether two records hold the same configuration data.
///
/// Both must have the same non-administrative keys, with equivalent values
/// under [`is_same_value`].
pub fn is_same_data(a: &ConfigurationRecord, b: &ConfigurationRecord) -> bool {
    let keys = configuration_keys(a);
    keys == configuration_keys(b) && keys.iter().all(|key| is_same_value(a.get(key), b.get(key)))
}

/// Remove from `target` every property that `base` holds with an equivalent
/// value. Never adds keys.
pub fn remove_redundant_properties(target: &mut ConfigurationRecord, base: &ConfigurationRecord) {
    for (key, value) in base.iter() {
        if target.get(key).is_some_and(|current| is_same_value(Some(current), Some(value))) {
            target.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pidsync_types::{ALIAS_KEY, CONFIG_PATH_KEY, SERVICE_FACTORY_PID, SERVICE_PID};
    use proptest::prelude::*;

    fn value(v: impl Into<PropertyValue>) -> PropertyValue {
        v.into()
    }

    #[test]
    fn clean_drops_administrative_keys() {
        let record = ConfigurationRecord::new()
            .with(SERVICE_PID, "p")
            .with(SERVICE_FACTORY_PID, "f")
            .with(ALIAS_KEY, "alias")
            .with(CONFIG_PATH_KEY, "/apps/x")
            .with("port", 80);
        let cleaned = clean_configuration(&record);
        assert_eq!(cleaned, ConfigurationRecord::new().with("port", 80));
    }

    #[test]
    fn same_value_nulls() {
        assert!(is_same_value(None, None));
        assert!(!is_same_value(Some(&value("x")), None));
        assert!(!is_same_value(None, Some(&value("x"))));
    }

    #[test]
    fn same_value_coerces_numbers_to_strings() {
        assert!(is_same_value(Some(&value(4)), Some(&value("4"))));
        assert!(is_same_value(Some(&value(true)), Some(&value("true"))));
        assert!(!is_same_value(Some(&value(4)), Some(&value("4.0"))));
    }

    #[test]
    fn same_value_sequences() {
        assert!(is_same_value(
            Some(&value(vec!["a", "b"])),
            Some(&value(vec!["a", "b"]))
        ));
        assert!(!is_same_value(
            Some(&value(vec!["a", "b"])),
            Some(&value(vec!["a", "c"]))
        ));
        assert!(!is_same_value(
            Some(&value(vec!["a"])),
            Some(&value(vec!["a", "b"]))
        ));
        assert!(is_same_value(Some(&value(vec![1, 2])), Some(&value(vec!["1", "2"]))));
    }

    #[test]
    fn scalar_never_equals_sequence() {
        assert!(!is_same_value(Some(&value("x")), Some(&value(vec!["x"]))));
        assert!(!is_same_value(Some(&value(vec!["x"])), Some(&value("x"))));
    }

    #[test]
    fn same_data_requires_same_keys() {
        let a = ConfigurationRecord::new().with("a", 1).with("b", 2);
        let b = ConfigurationRecord::new().with("a", "1");
        assert!(!is_same_data(&a, &b));
        assert!(!is_same_data(&b, &a));
        let c = ConfigurationRecord::new().with("a", "1").with("b", "2");
        assert!(is_same_data(&a, &c));
    }

    #[test]
    fn same_data_ignores_administrative_keys() {
        let a = ConfigurationRecord::new().with("k", "v").with(SERVICE_PID, "x");
        let b = ConfigurationRecord::new().with("k", "v").with(ALIAS_KEY, "y");
        assert!(is_same_data(&a, &b));
    }

    #[test]
    fn redundant_properties_removed() {
        let mut target = ConfigurationRecord::new().with("a", 1).with("b", 2);
        let base = ConfigurationRecord::new().with("a", 1).with("c", 9);
        remove_redundant_properties(&mut target, &base);
        assert_eq!(target, ConfigurationRecord::new().with("b", 2));
    }

    #[test]
    fn redundant_properties_keeps_changed_values() {
        let mut target = ConfigurationRecord::new().with("a", "new");
        let base = ConfigurationRecord::new().with("a", "old");
        remove_redundant_properties(&mut target, &base);
        assert_eq!(target.len(), 1);
    }

    fn arb_scalar() -> impl Strategy<Value = PropertyValue> {
        prop_oneof![
            any::<i64>().prop_map(PropertyValue::from),
            any::<bool>().prop_map(PropertyValue::from),
            "[a-z0-9]{0,8}".prop_map(PropertyValue::from),
            prop::collection::vec("[a-z]{0,4}", 0..4).prop_map(PropertyValue::from),
        ]
    }

    fn arb_record() -> impl Strategy<Value = ConfigurationRecord> {
        prop::collection::btree_map("[a-z]{1,6}", arb_scalar(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    proptest! {
        #[test]
        fn same_data_is_reflexive(record in arb_record()) {
            let cleaned = clean_configuration(&record);
            prop_assert!(is_same_data(&cleaned, &cleaned));
        }

        #[test]
        fn administrative_differences_are_invisible(record in arb_record(), marker in "[a-z.]{1,12}") {
            let with_admin = record.clone().with(SERVICE_PID, marker.clone()).with(CONFIG_PATH_KEY, marker);
            prop_assert!(is_same_data(&record, &with_admin));
        }
    }
}
