//! Domain types for forksync.
//!
//! Names coming from the hosting API or from configuration are wrapped in
//! newtypes so an organization can never be passed where a branch is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! name_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

name_newtype!(
    /// A GitHub organization (or user) login, e.g. `source-test`.
    OrgName
);

name_newtype!(
    /// A repository name inside an organization, without the `org/` prefix.
    RepoName
);

name_newtype!(
    /// A git branch or destination ref name, e.g. `TEST` or `BUILD`.
    BranchName
);

impl RepoName {
    /// `org/repo` slug as understood by `gh`.
    pub fn slug(&self, org: &OrgName) -> String {
        format!("{}/{}", org.0, self.0)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// One source organization and the branch its repositories are reconciled onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTarget {
    pub org: OrgName,
    pub branch: BranchName,
}

impl SourceTarget {
    pub fn new(org: impl Into<OrgName>, branch: impl Into<BranchName>) -> Self {
        Self {
            org: org.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for SourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.org, self.branch)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(OrgName::from("acme").to_string(), "acme");
        assert_eq!(RepoName::from("api").to_string(), "api");
        assert_eq!(BranchName::from("TEST").to_string(), "TEST");
    }

    #[test]
    fn repo_slug_joins_org() {
        let repo = RepoName::from("api");
        assert_eq!(repo.slug(&OrgName::from("acme")), "acme/api");
    }

    #[test]
    fn source_target_yaml_is_flat_strings() {
        let target = SourceTarget::new("acme", "DEV");
        let yaml = serde_yaml::to_string(&target).expect("serialize");
        assert!(yaml.contains("org: acme"));
        assert!(yaml.contains("branch: DEV"));
        let back: SourceTarget = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back, target);
    }
}
