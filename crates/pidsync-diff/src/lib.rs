//! Dictionary normalizer for pidsync.
//!
//! Decides when two configuration dictionaries hold the same data, so that
//! redundant writes and redundant serialized properties can be suppressed.
//!
//! # Key Items
//!
//! - [`clean_configuration`] -- strip administrative keys
//! - [`is_same_value`] / [`is_same_data`] -- string-coerced equivalence
//! - [`remove_redundant_properties`] -- drop properties a base already holds
//! - [`diff_records`] / [`RecordDiff`] -- per-key changes between two records

pub mod normalize;
pub mod record_diff;

pub use normalize::{clean_configuration, is_same_data, is_same_value, remove_redundant_properties};
pub use record_diff::{diff_records, RecordChange, RecordDiff};
