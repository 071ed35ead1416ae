//! Conjunctive equality filters in LDAP syntax.
//!
//! Only the subset the installer needs is supported: a single `(key=value)`
//! clause or a conjunction `(&(k1=v1)(k2=v2)...)`. Literal values escape
//! `\`, `*`, `(` and `)` with a backslash.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use pidsync_types::{PropertyValue, SERVICE_FACTORY_PID, SERVICE_PID};

use crate::configuration::StoredConfiguration;
use crate::error::{StoreError, StoreResult};

/// Escape a literal filter value.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '*' | '(' | ')') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// A conjunction of `key = value` clauses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    clauses: Vec<(String, String)>,
}

impl Filter {
    /// Filter with a single equality clause.
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and(key, value)
    }

    /// Add another equality clause.
    pub fn and(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push((key.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, String)] {
        &self.clauses
    }

    /// Parse the textual form produced by `Display`.
    pub fn parse(input: &str) -> StoreResult<Self> {
        Parser::new(input).parse()
    }

    /// Whether every clause holds for `config`.
    ///
    /// `service.pid` and `service.factoryPid` match the record's identity;
    /// other keys match the string form of the property, or any element of a
    /// sequence property.
    pub fn matches(&self, config: &StoredConfiguration) -> bool {
        self.clauses.iter().all(|(key, value)| match key.as_str() {
            SERVICE_PID => config.pid == *value,
            SERVICE_FACTORY_PID => config.factory_pid.as_deref() == Some(value.as_str()),
            _ => match config.properties.as_ref().and_then(|p| p.get(key)) {
                Some(PropertyValue::Scalar(s)) => s.coerce() == value.as_str(),
                Some(PropertyValue::Sequence(items)) => {
                    items.iter().any(|s| s.coerce() == value.as_str())
                }
                None => false,
            },
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [(key, value)] = self.clauses.as_slice() {
            return write!(f, "({key}={})", escape_value(value));
        }
        f.write_str("(&")?;
        for (key, value) in &self.clauses {
            write!(f, "({key}={})", escape_value(value))?;
        }
        f.write_str(")")
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.trim().chars().peekable(),
        }
    }

    fn error(&self, reason: impl Into<String>) -> StoreError {
        StoreError::InvalidFilter {
            filter: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn expect(&mut self, expected: char) -> StoreResult<()> {
        match self.chars.next() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(self.error(format!("expected {expected:?}, found {c:?}"))),
            None => Err(self.error(format!("expected {expected:?}, found end of input"))),
        }
    }

    fn parse(mut self) -> StoreResult<Filter> {
        self.expect('(')?;
        let mut filter = Filter::default();
        if self.chars.peek() == Some(&'&') {
            self.chars.next();
            while self.chars.peek() == Some(&'(') {
                self.chars.next();
                filter.clauses.push(self.clause()?);
            }
            self.expect(')')?;
            if filter.clauses.is_empty() {
                return Err(self.error("empty conjunction"));
            }
        } else {
            filter.clauses.push(self.clause()?);
        }
        if self.chars.next().is_some() {
            return Err(self.error("trailing input after filter"));
        }
        Ok(filter)
    }

    /// Parse `key=value)` after the opening parenthesis.
    fn clause(&mut self) -> StoreResult<(String, String)> {
        let mut key = String::new();
        loop {
            match self.chars.next() {
                Some('=') => break,
                Some(c @ ('(' | ')' | '*' | '\\' | '&' | '|' | '!')) => {
                    return Err(self.error(format!("unexpected {c:?} in attribute name")));
                }
                Some(c) => key.push(c),
                None => return Err(self.error("unterminated clause")),
            }
        }
        if key.trim().is_empty() {
            return Err(self.error("empty attribute name"));
        }

        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some(')') => break,
                Some('\\') => match self.chars.next() {
                    Some(c) => value.push(c),
                    None => return Err(self.error("dangling escape")),
                },
                Some(c @ ('(' | '*')) => {
                    return Err(self.error(format!("unescaped {c:?} in value")));
                }
                Some(c) => value.push(c),
                None => return Err(self.error("unterminated clause")),
            }
        }
        Ok((key.trim().to_string(), value))
    }
}
