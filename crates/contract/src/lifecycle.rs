//! Product lifecycle graph.
//!
//! The graph is a static, immutable definition shared by every record. A
//! record's current state always lives on the record itself; nothing here
//! holds per-record state.
//!
//! ```text
//! manufactured --inspect--> inspected --ship--> shipped --receive--> stocked --label--> labeled --sell--> sold
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorization::Role;
use crate::error::ContractError;

/// Lifecycle states. The derived ordering is lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Manufactured,
    Inspected,
    Shipped,
    Stocked,
    Labeled,
    Sold,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 6] = [
        LifecycleState::Manufactured,
        LifecycleState::Inspected,
        LifecycleState::Shipped,
        LifecycleState::Stocked,
        LifecycleState::Labeled,
        LifecycleState::Sold,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Manufactured => "manufactured",
            LifecycleState::Inspected => "inspected",
            LifecycleState::Shipped => "shipped",
            LifecycleState::Stocked => "stocked",
            LifecycleState::Labeled => "labeled",
            LifecycleState::Sold => "sold",
        }
    }

    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        next_transition(self).is_none()
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Named transitions, including the `manufacture` creation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Gates `createProduct`; has no edge in the graph.
    Manufacture,
    Inspect,
    Ship,
    Receive,
    Label,
    Sell,
}

impl Transition {
    pub const ALL: [Transition; 6] = [
        Transition::Manufacture,
        Transition::Inspect,
        Transition::Ship,
        Transition::Receive,
        Transition::Label,
        Transition::Sell,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Manufacture => "manufacture",
            Transition::Inspect => "inspect",
            Transition::Ship => "ship",
            Transition::Receive => "receive",
            Transition::Label => "label",
            Transition::Sell => "sell",
        }
    }

    /// The permission token a caller must hold to perform this transition.
    pub fn permission(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transition {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transition::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ContractError::UnknownTransition {
                name: s.to_string(),
            })
    }
}

/// A directed, role-gated edge of the lifecycle graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub transition: &'static str,
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub role: Role,
}

const EDGES: [Edge; 5] = [
    Edge {
        transition: "inspect",
        from: LifecycleState::Manufactured,
        to: LifecycleState::Inspected,
        role: Role::Supplier,
    },
    Edge {
        transition: "ship",
        from: LifecycleState::Inspected,
        to: LifecycleState::Shipped,
        role: Role::Supplier,
    },
    Edge {
        transition: "receive",
        from: LifecycleState::Shipped,
        to: LifecycleState::Stocked,
        role: Role::Retailer,
    },
    Edge {
        transition: "label",
        from: LifecycleState::Stocked,
        to: LifecycleState::Labeled,
        role: Role::Retailer,
    },
    Edge {
        transition: "sell",
        from: LifecycleState::Labeled,
        to: LifecycleState::Sold,
        role: Role::Retailer,
    },
];

/// Every state a product record starts in.
pub fn initial_state() -> LifecycleState {
    LifecycleState::Manufactured
}

/// All edges, in lifecycle order.
pub fn edges() -> &'static [Edge] {
    &EDGES
}

/// The edge for `transition`; `None` for the `manufacture` gate.
pub fn edge(transition: Transition) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.transition == transition.as_str())
}

/// Look up an edge by transition name.
///
/// Fails with `UnknownTransition` for any name without an edge, including
/// `manufacture`.
pub fn edge_for(name: &str) -> Result<&'static Edge, ContractError> {
    EDGES
        .iter()
        .find(|e| e.transition == name)
        .ok_or_else(|| ContractError::UnknownTransition {
            name: name.to_string(),
        })
}

/// The single legal transition out of `state`, if any.
pub fn next_transition(state: LifecycleState) -> Option<&'static Edge> {
    EDGES.iter().find(|e| e.from == state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_is_a_single_chain() {
        let mut state = initial_state();
        let mut visited = vec![state];
        while let Some(edge) = next_transition(state) {
            assert!(edge.to > edge.from, "{} must move forward", edge.transition);
            state = edge.to;
            visited.push(state);
        }
        assert_eq!(visited, LifecycleState::ALL.to_vec());
        assert_eq!(state, LifecycleState::Sold);
    }

    #[test]
    fn only_sold_is_terminal() {
        for state in LifecycleState::ALL {
            assert_eq!(state.is_terminal(), state == LifecycleState::Sold);
        }
    }

    #[test]
    fn edge_for_known_names() {
        let e = edge_for("receive").unwrap();
        assert_eq!(e.from, LifecycleState::Shipped);
        assert_eq!(e.to, LifecycleState::Stocked);
        assert_eq!(e.role, Role::Retailer);
    }

    #[test]
    fn edge_for_rejects_manufacture_and_unknown() {
        assert!(matches!(
            edge_for("manufacture"),
            Err(ContractError::UnknownTransition { .. })
        ));
        assert!(matches!(
            edge_for("goto"),
            Err(ContractError::UnknownTransition { name }) if name == "goto"
        ));
    }

    #[test]
    fn no_edge_has_a_wildcard_source() {
        // Each state has at most one outgoing edge, and every edge leaves
        // from exactly one concrete state.
        for state in LifecycleState::ALL {
            assert!(edges().iter().filter(|e| e.from == state).count() <= 1);
        }
    }

    #[test]
    fn transition_round_trips_through_str() {
        for t in Transition::ALL {
            assert_eq!(t.as_str().parse::<Transition>().unwrap(), t);
        }
        assert!("Inspect".parse::<Transition>().is_err());
    }

    #[test]
    fn manufacture_has_no_edge() {
        assert!(edge(Transition::Manufacture).is_none());
        for t in &Transition::ALL[1..] {
            assert!(edge(*t).is_some(), "{t} should have an edge");
        }
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&LifecycleState::Labeled).unwrap();
        assert_eq!(json, "\"labeled\"");
    }
}
