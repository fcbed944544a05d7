//! Event type definitions for user admissions.
//!
//! Identifiers are opaque, case-sensitive strings compared byte for byte.

use std::fmt;

/// Suffix appended to the stored value of a direct admission.
pub const DIRECT_VALUE_SUFFIX: &str = "value";

/// Which pathway an admission took into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionPath {
    /// Handed to the event loop over the intake channel.
    Intake,
    /// Written synchronously by the caller, bypassing the event loop.
    Direct,
}

impl fmt::Display for AdmissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPath::Intake => write!(f, "intake"),
            AdmissionPath::Direct => write!(f, "direct"),
        }
    }
}

/// A user identifier on its way into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub user: String,
    pub path: AdmissionPath,
}

impl Admission {
    pub fn intake(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            path: AdmissionPath::Intake,
        }
    }

    pub fn direct(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            path: AdmissionPath::Direct,
        }
    }

    /// The value stored under [`user`](Admission::user).
    ///
    /// Intake admissions store the bare identifier; direct admissions store
    /// the identifier followed by [`DIRECT_VALUE_SUFFIX`]. The two pathways
    /// intentionally disagree.
    pub fn stored_value(&self) -> String {
        match self.path {
            AdmissionPath::Intake => self.user.clone(),
            AdmissionPath::Direct => format!("{}{}", self.user, DIRECT_VALUE_SUFFIX),
        }
    }
}

/// The line emitted when the event loop admits a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionNotice<'a> {
    pub user: &'a str,
}

impl fmt::Display for AdmissionNotice<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "adding new user {}", self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_value_differs_by_path() {
        assert_eq!(Admission::intake("alice").stored_value(), "alice");
        assert_eq!(Admission::direct("carol").stored_value(), "carolvalue");
    }

    #[test]
    fn test_identifiers_are_case_sensitive() {
        assert_ne!(Admission::intake("Bob"), Admission::intake("bob"));
    }

    #[test]
    fn test_admission_notice_format() {
        let notice = AdmissionNotice { user: "alice" };
        assert_eq!(notice.to_string(), "adding new user alice");
    }
}
