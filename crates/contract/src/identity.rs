//! Caller identity assertions.
//!
//! The contract never authenticates credentials. An [`IdentityOracle`]
//! supplies the attributes an already-authenticated caller asserts, and
//! [`IdentityAssertion::resolve`] turns them into the affiliation and
//! permission set the authorization checker evaluates.

use std::collections::{BTreeMap, BTreeSet};

/// Attribute holding the caller's permission tokens.
pub const PERMISSIONS_ATTRIBUTE: &str = "permissions";

/// Permission set assumed when the attribute is missing or empty.
pub const DEFAULT_PERMISSION: &str = "default";

/// Separators accepted between permission tokens.
const PERMISSION_SEPARATORS: [char; 2] = ['_', '|'];

/// Source of the current caller's asserted attributes.
pub trait IdentityOracle {
    /// The caller's organizational affiliation, if the credential carries one.
    fn affiliation(&self) -> Option<String>;

    /// A named credential attribute.
    fn attribute(&self, name: &str) -> Option<String>;
}

/// An identity oracle built from explicit values (CLI flags, request headers, tests).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    pub affiliation: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl StaticIdentity {
    pub fn new(affiliation: impl Into<String>) -> Self {
        Self {
            affiliation: Some(affiliation.into()),
            attributes: BTreeMap::new(),
        }
    }

    /// Set the raw `permissions` attribute.
    pub fn with_permissions(mut self, raw: impl Into<String>) -> Self {
        self.attributes
            .insert(PERMISSIONS_ATTRIBUTE.to_string(), raw.into());
        self
    }

    /// A caller whose credential carries no attributes at all.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl IdentityOracle for StaticIdentity {
    fn affiliation(&self) -> Option<String> {
        self.affiliation.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(name).cloned()
    }
}

/// The affiliation and permission set asserted for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    /// Empty when the credential carries no affiliation.
    pub affiliation: String,
    pub permissions: BTreeSet<String>,
}

impl IdentityAssertion {
    pub fn resolve<O: IdentityOracle + ?Sized>(oracle: &O) -> Self {
        Self {
            affiliation: oracle.affiliation().unwrap_or_default(),
            permissions: parse_permissions(oracle.attribute(PERMISSIONS_ATTRIBUTE).as_deref()),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Split a raw permissions attribute into tokens.
///
/// Empty tokens are dropped. A missing attribute, or one with no tokens,
/// yields the `{"default"}` sentinel set.
pub fn parse_permissions(raw: Option<&str>) -> BTreeSet<String> {
    let tokens: BTreeSet<String> = raw
        .unwrap_or_default()
        .split(PERMISSION_SEPARATORS)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        BTreeSet::from([DEFAULT_PERMISSION.to_string()])
    } else {
        tokens
    }
}
