//! Immutability checks for UPDATE requests.
//!
//! Each kind lists its protected fields in a fixed order; the first field
//! whose new value differs from the stored one is reported and the rest are
//! not examined. Equality is spelled out per type rather than derived, so
//! what counts as "changed" stays visible next to the rule that uses it.

use std::collections::BTreeMap;

use pkg_types::component::GitSource;
use pkg_types::promotion::PromotionRunSpec;

use crate::error::Violation;

/// A value that can be compared across two revisions and shown in a denial.
pub trait Immutable {
    fn unchanged(&self, other: &Self) -> bool;

    /// How the attempted value is shown to the requester.
    fn render(&self) -> String;
}

impl Immutable for str {
    fn unchanged(&self, other: &Self) -> bool {
        self == other
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

impl Immutable for String {
    fn unchanged(&self, other: &Self) -> bool {
        self.as_str().unchanged(other.as_str())
    }

    fn render(&self) -> String {
        self.clone()
    }
}

impl Immutable for BTreeMap<String, String> {
    fn unchanged(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key).is_some_and(|v| v == value))
    }

    fn render(&self) -> String {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        format!("{{{}}}", pairs.join(", "))
    }
}

impl Immutable for GitSource {
    fn unchanged(&self, other: &Self) -> bool {
        self.url == other.url
            && self.revision == other.revision
            && self.context == other.context
            && self.devfile_url == other.devfile_url
            && self.dockerfile_url == other.dockerfile_url
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

impl Immutable for PromotionRunSpec {
    fn unchanged(&self, other: &Self) -> bool {
        self.snapshot == other.snapshot
            && self.application == other.application
            && self.manual_promotion.as_ref().map(|m| &m.target_environment)
                == other.manual_promotion.as_ref().map(|m| &m.target_environment)
            && self
                .automated_promotion
                .as_ref()
                .map(|a| &a.initial_environment)
                == other
                    .automated_promotion
                    .as_ref()
                    .map(|a| &a.initial_environment)
    }

    fn render(&self) -> String {
        format!("{:?}", self)
    }
}

/// Ordered list of protected fields, evaluated first-violation-wins.
#[derive(Debug, Default)]
pub struct ImmutableFields {
    first_change: Option<Violation>,
}

impl ImmutableFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// The field may never change.
    pub fn field<T: Immutable + ?Sized>(mut self, name: &'static str, old: &T, new: &T) -> Self {
        if self.first_change.is_none() && !old.unchanged(new) {
            self.first_change = Some(Violation::FieldChanged {
                field: name,
                attempted: new.render(),
            });
        }
        self
    }

    /// The field may be populated once, then never changed or cleared.
    pub fn set_once<T: Immutable>(self, name: &'static str, old: Option<&T>, new: Option<&T>) -> Self {
        match (old, new) {
            (Some(old), Some(new)) => self.field(name, old, new),
            (Some(_), None) => self.record(name, "<unset>".to_string()),
            (None, _) => self,
        }
    }

    fn record(mut self, name: &'static str, attempted: String) -> Self {
        if self.first_change.is_none() {
            self.first_change = Some(Violation::FieldChanged {
                field: name,
                attempted,
            });
        }
        self
    }

    pub fn check(self) -> Result<(), Violation> {
        match self.first_change {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

/// The whole spec is frozen at creation; the denial shows both revisions.
pub fn check_spec_unchanged<T: Immutable>(old: &T, new: &T) -> Result<(), Violation> {
    if old.unchanged(new) {
        return Ok(());
    }
    Err(Violation::SpecChanged {
        attempted: new.render(),
        current: old.render(),
    })
}
