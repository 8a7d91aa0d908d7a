//! Complaint lifecycle states and the legal transitions between them

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Lifecycle state of a complaint
///
/// Complaints advance strictly forward, one state at a time:
/// Pending -> Read -> InRepair -> Solved. Solved is terminal.
/// No skips and no reversals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ComplaintStatus {
    /// Submitted, not yet seen by municipal staff
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    /// Acknowledged by staff
    #[serde(rename = "Leído")]
    Read,
    /// A repair crew is working on it
    #[serde(rename = "En reparación")]
    InRepair,
    /// Work finished, terminal
    #[serde(rename = "Solucionado")]
    Solved,
}

/// Legal transitions: each state advances only to its direct successor
const TRANSITIONS: &[(ComplaintStatus, ComplaintStatus)] = &[
    (ComplaintStatus::Pending, ComplaintStatus::Read),
    (ComplaintStatus::Read, ComplaintStatus::InRepair),
    (ComplaintStatus::InRepair, ComplaintStatus::Solved),
];

impl ComplaintStatus {
    /// All states in lifecycle order
    pub const ALL: [ComplaintStatus; 4] = [
        ComplaintStatus::Pending,
        ComplaintStatus::Read,
        ComplaintStatus::InRepair,
        ComplaintStatus::Solved,
    ];

    /// Check whether `self -> target` is a legal lifecycle step
    pub fn can_transition_to(self, target: ComplaintStatus) -> bool {
        TRANSITIONS.contains(&(self, target))
    }

    /// Validate `self -> target`, rejecting anything but the exact next step
    pub fn validate_transition(self, target: ComplaintStatus) -> Result<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self,
                to: target,
            })
        }
    }

    /// The only state this one may advance to, if any
    pub fn successor(self) -> Option<ComplaintStatus> {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
    }

    /// The state a record must hold before it can move to `self`
    pub fn required_predecessor(self) -> Option<ComplaintStatus> {
        TRANSITIONS
            .iter()
            .find(|(_, to)| *to == self)
            .map(|(from, _)| *from)
    }

    /// True once no further transition is possible
    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }

    /// Token stored in the local database column
    pub fn db_token(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "PENDIENTE",
            ComplaintStatus::Read => "LEIDO",
            ComplaintStatus::InRepair => "EN_REPARACION",
            ComplaintStatus::Solved => "SOLUCIONADO",
        }
    }

    /// Parse a local database token
    pub fn from_db_token(s: &str) -> Option<ComplaintStatus> {
        match s {
            "PENDIENTE" => Some(ComplaintStatus::Pending),
            "LEIDO" => Some(ComplaintStatus::Read),
            "EN_REPARACION" => Some(ComplaintStatus::InRepair),
            "SOLUCIONADO" => Some(ComplaintStatus::Solved),
            _ => None,
        }
    }

    /// Display form, as stored in cloud documents and shown to users
    pub fn display_name(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pendiente",
            ComplaintStatus::Read => "Leído",
            ComplaintStatus::InRepair => "En reparación",
            ComplaintStatus::Solved => "Solucionado",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pendiente" => Ok(ComplaintStatus::Pending),
            "Leído" => Ok(ComplaintStatus::Read),
            "En reparación" => Ok(ComplaintStatus::InRepair),
            "Solucionado" => Ok(ComplaintStatus::Solved),
            _ => Err(format!("unknown complaint status: {s}")),
        }
    }
}
