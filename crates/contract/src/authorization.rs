//! Transition authorization.
//!
//! A caller may perform a transition only if its asserted affiliation equals
//! the role the transition requires AND its permission set contains the
//! transition's permission token. The two checks are reported separately
//! so a denial says which one failed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::identity::IdentityAssertion;
use crate::lifecycle::Transition;

/// Organizational roles allowed to move products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Supplier,
    Retailer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Supplier => "Supplier",
            Role::Retailer => "Retailer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a transition requires.
///
/// `manufacture`, `inspect` and `ship` belong to the supplier; `receive`,
/// `label` and `sell` to the retailer.
pub fn required_role(transition: Transition) -> Role {
    match transition {
        Transition::Manufacture | Transition::Inspect | Transition::Ship => Role::Supplier,
        Transition::Receive | Transition::Label | Transition::Sell => Role::Retailer,
    }
}

/// Why an authorization check failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Denial {
    pub required_role: Role,
    pub required_permission: String,
    /// The affiliation the caller asserted (empty if none).
    pub affiliation: String,
    pub affiliation_mismatch: bool,
    pub permission_missing: bool,
}

impl Denial {
    pub fn missing_affiliation(&self) -> bool {
        self.affiliation_mismatch
    }

    pub fn missing_permission(&self) -> bool {
        self.permission_missing
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "affiliation {} and permission {} required",
            self.required_role, self.required_permission
        )?;
        match (self.affiliation_mismatch, self.permission_missing) {
            (true, true) => write!(
                f,
                " (caller affiliation '{}' does not match and permission is missing)",
                self.affiliation
            ),
            (true, false) => write!(
                f,
                " (caller affiliation '{}' does not match)",
                self.affiliation
            ),
            (false, true) => write!(f, " (permission missing)"),
            (false, false) => Ok(()),
        }
    }
}

/// Decide whether `identity` may act as `role` with `permission`.
pub fn authorize(identity: &IdentityAssertion, role: Role, permission: &str) -> Result<(), Denial> {
    let affiliation_mismatch = identity.affiliation != role.as_str();
    let permission_missing = !identity.has_permission(permission);
    if affiliation_mismatch || permission_missing {
        return Err(Denial {
            required_role: role,
            required_permission: permission.to_string(),
            affiliation: identity.affiliation.clone(),
            affiliation_mismatch,
            permission_missing,
        });
    }
    Ok(())
}

/// Authorize `identity` for `transition` using the fixed role mapping.
pub fn authorize_transition(
    identity: &IdentityAssertion,
    transition: Transition,
) -> Result<(), ContractError> {
    authorize(identity, required_role(transition), transition.permission())
        .map_err(ContractError::Unauthorized)
}
