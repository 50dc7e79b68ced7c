//! # Trader Module
//!
//! Platform roles and the Trader record. Only team leads (and the owner)
//! control security requirements; only trader devices relay bank
//! notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraderRole {
    /// Platform owner - full control
    Owner,
    /// Investor - read-only financials
    Investor,
    /// Support - handles disputes
    Support,
    /// Team lead - manages a team of traders, sets security requirements
    TeamLead,
    /// Trader - processes payments, owns a deposit ledger
    Trader,
}

impl TraderRole {
    /// DB code string
    pub fn as_str(&self) -> &'static str {
        match self {
            TraderRole::Owner => "owner",
            TraderRole::Investor => "investor",
            TraderRole::Support => "support",
            TraderRole::TeamLead => "teamlead",
            TraderRole::Trader => "trader",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(TraderRole::Owner),
            "investor" => Some(TraderRole::Investor),
            "support" => Some(TraderRole::Support),
            "teamlead" => Some(TraderRole::TeamLead),
            "trader" => Some(TraderRole::Trader),
            _ => None,
        }
    }

    /// Whether this role owns a deposit ledger
    pub fn has_ledger(&self) -> bool {
        matches!(self, TraderRole::Trader)
    }

    /// Whether this role may change a trader's required security
    pub fn can_set_security(&self) -> bool {
        matches!(self, TraderRole::TeamLead | TraderRole::Owner)
    }

    /// Whether this role's devices may relay bank notifications
    pub fn can_relay_notifications(&self) -> bool {
        matches!(self, TraderRole::Trader)
    }

    /// Whether this role may resolve disputes
    pub fn can_resolve_disputes(&self) -> bool {
        matches!(
            self,
            TraderRole::Support | TraderRole::TeamLead | TraderRole::Owner
        )
    }

    /// Whether this role may read the event journal
    pub fn can_audit(&self) -> bool {
        matches!(
            self,
            TraderRole::Owner | TraderRole::Investor | TraderRole::TeamLead
        )
    }
}

impl fmt::Display for TraderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A platform user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trader {
    /// ID (TRD_001, TL_001, ...)
    pub id: String,
    /// Login name, unique
    pub username: String,
    /// Role
    pub role: TraderRole,
    /// Team the user belongs to, if any
    pub team_id: Option<String>,
    /// Deactivated users keep their history but cannot act
    pub is_active: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Trader {
    /// Create a new user record
    pub fn new(id: &str, username: &str, role: TraderRole) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            role,
            team_id: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Create a trader
    pub fn trader(id: &str, username: &str) -> Self {
        Self::new(id, username, TraderRole::Trader)
    }

    /// Create a team lead
    pub fn team_lead(id: &str, username: &str) -> Self {
        Self::new(id, username, TraderRole::TeamLead)
    }

    /// Assign to a team
    pub fn with_team(mut self, team_id: &str) -> Self {
        self.team_id = Some(team_id.to_string());
        self
    }

    /// Deactivate this user
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Generate an ID for a new trader
    pub fn generate_id(counter: u32) -> String {
        format!("TRD_{:03}", counter)
    }
}

impl fmt::Display for Trader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}{})",
            self.id,
            self.username,
            self.role,
            if self.is_active { "" } else { ", inactive" }
        )
    }
}
