//! Enum types mirrored from the backend schema.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received into central stock.
    Entry,
    /// Goods handed to a technician (moves into their inventory).
    ExitTechnician,
    /// Goods leaving stock without a named recipient.
    ExitAnonymous,
    /// Goods written off (breakage, theft, expiry).
    ExitLoss,
}

impl MovementType {
    pub fn is_exit(self) -> bool {
        !matches!(self, Self::Entry)
    }

    /// Whether this movement also changes a technician's personal inventory.
    pub fn touches_technician(self) -> bool {
        matches!(self, Self::ExitTechnician)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::ExitTechnician => "exit_technician",
            Self::ExitAnonymous => "exit_anonymous",
            Self::ExitLoss => "exit_loss",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a user inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

/// Lifecycle of an invitation to join an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}
