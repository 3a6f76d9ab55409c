//! Organization and group ids, and the search scope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidInputError};

/// A strictly positive organization id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct OrgId(i64);

impl OrgId {
    /// Create a new organization id.
    pub fn new(id: i64) -> Result<Self, Error> {
        if id <= 0 {
            return Err(InvalidInputError::OrgId {
                value: id.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }
        Ok(Self(id))
    }

    /// Returns the numeric id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrgId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().parse::<i64>().map_err(|e| InvalidInputError::OrgId {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Self::new(id)
    }
}

impl TryFrom<i64> for OrgId {
    type Error = Error;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<OrgId> for i64 {
    fn from(id: OrgId) -> Self {
        id.0
    }
}

/// A strictly positive group id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct GroupId(i64);

impl GroupId {
    /// Create a new group id.
    pub fn new(id: i64) -> Result<Self, Error> {
        if id <= 0 {
            return Err(InvalidInputError::GroupId {
                value: id.to_string(),
                reason: "must be positive".to_string(),
            }
            .into());
        }
        Ok(Self(id))
    }

    /// Returns the numeric id.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s
            .trim()
            .parse::<i64>()
            .map_err(|e| InvalidInputError::GroupId {
                value: s.to_string(),
                reason: e.to_string(),
            })?;
        Self::new(id)
    }
}

impl TryFrom<i64> for GroupId {
    type Error = Error;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<GroupId> for i64 {
    fn from(id: GroupId) -> Self {
        id.0
    }
}

/// The account context a search runs in.
///
/// Personal accounts and organization members see different owned and
/// shared-in listings; group and public listings do not depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// An individual account outside any organization.
    #[default]
    Personal,
    /// A member account of the given organization.
    Org(OrgId),
}

impl Scope {
    /// Build a scope from an optional organization id.
    pub fn from_org(org: Option<OrgId>) -> Self {
        match org {
            Some(org) => Scope::Org(org),
            None => Scope::Personal,
        }
    }

    /// Returns the organization id for org-scoped searches.
    pub fn org_id(&self) -> Option<OrgId> {
        match self {
            Scope::Personal => None,
            Scope::Org(org) => Some(*org),
        }
    }

    /// Returns true if a repository belonging to `org` is visible in this scope.
    pub fn contains(&self, org: Option<OrgId>) -> bool {
        self.org_id() == org
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Personal => write!(f, "personal"),
            Scope::Org(org) => write!(f, "org:{}", org),
        }
    }
}
