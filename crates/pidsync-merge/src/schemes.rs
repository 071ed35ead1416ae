//! The allow list of schemes that may contribute default properties.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, MergeResult};

/// Set of scheme names eligible to contribute inherited properties.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeSchemes {
    schemes: BTreeSet<String>,
}

impl MergeSchemes {
    pub fn new<I, S>(schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: schemes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list such as `"default, launchpad"`.
    ///
    /// Entries are trimmed and empty entries skipped; a list with no
    /// entries left, or an entry containing whitespace, is rejected.
    pub fn parse(list: &str) -> MergeResult<Self> {
        let mut schemes = BTreeSet::new();
        for entry in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if entry.chars().any(char::is_whitespace) {
                return Err(MergeError::InvalidScheme {
                    scheme: entry.to_string(),
                    reason: "contains whitespace".into(),
                });
            }
            schemes.insert(entry.to_string());
        }
        if schemes.is_empty() {
            return Err(MergeError::EmptySchemeList);
        }
        Ok(Self { schemes })
    }

    pub fn contains(&self, scheme: &str) -> bool {
        self.schemes.contains(scheme)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl FromStr for MergeSchemes {
    type Err = MergeError;

    fn from_str(s: &str) -> MergeResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for MergeSchemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<&str> = self.iter().collect();
        write!(f, "{}", list.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_skips_empty() {
        let schemes = MergeSchemes::parse(" default ,, launchpad,").unwrap();
        assert_eq!(schemes.len(), 2);
        assert!(schemes.contains("default"));
        assert!(schemes.contains("launchpad"));
        assert!(!schemes.contains(""));
    }

    #[test]
    fn parse_rejects_empty_list() {
        assert_eq!(MergeSchemes::parse(" , "), Err(MergeError::EmptySchemeList));
        assert_eq!(MergeSchemes::parse(""), Err(MergeError::EmptySchemeList));
    }

    #[test]
    fn parse_rejects_inner_whitespace() {
        let err = MergeSchemes::parse("a b").unwrap_err();
        assert!(matches!(err, MergeError::InvalidScheme { scheme, .. } if scheme == "a b"));
    }

    #[test]
    fn display_is_sorted_and_parseable() {
        let schemes: MergeSchemes = "b,a".parse().unwrap();
        assert_eq!(schemes.to_string(), "a,b");
        assert_eq!(schemes.to_string().parse::<MergeSchemes>().unwrap(), schemes);
    }

    #[test]
    fn serializes_as_list() {
        let schemes = MergeSchemes::new(["x", "y"]);
        let json = serde_json::to_string(&schemes).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: MergeSchemes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schemes);
    }
}
