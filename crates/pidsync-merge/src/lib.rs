//! Merge engine for pidsync.
//!
//! Several resources may contribute to one configuration record. The first
//! resource of a group is the primary one; lower-priority siblings whose
//! scheme is on the merge allow list fill in properties the primary does
//! not set. The same allow list lets an external edit be stripped of the
//! properties it merely inherited.
//!
//! All functions here are pure over their inputs; [`ConfigurationMerger`]
//! only reads the installed groups it is given.

pub mod error;
pub mod merge;
pub mod merger;
pub mod schemes;

pub use error::{MergeError, MergeResult};
pub use merge::{effective_install_dictionary, merge_reverse_order};
pub use merger::ConfigurationMerger;
pub use schemes::MergeSchemes;
