use serde::{Deserialize, Serialize};

/// An account request: a tenant organization and its three role holders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// Membership service provider of the tenant, e.g. `Org2MSP`.
    pub mspid: String,
    pub users: AccountUsers,
}

/// Common names of the users holding each role within an account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountUsers {
    #[serde(default)]
    pub system_owner: String,
    #[serde(default)]
    pub system_administrator: String,
    #[serde(default)]
    pub acquisition_specialist: String,
}

/// Lifecycle status of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    #[serde(rename = "Pending: waiting for approval")]
    PendingApproval,
    #[serde(rename = "Pending: waiting for ATO")]
    PendingAto,
    #[serde(rename = "Pending: request denied")]
    PendingDenied,
    #[serde(rename = "Approved")]
    Approved,
    #[serde(rename = "Inactive: waiting for ATO renewal")]
    InactiveAto,
    #[serde(rename = "Inactive: opted out")]
    InactiveOptOut,
    #[serde(rename = "Inactive: security risk")]
    InactiveSecurityRisk,
    #[serde(rename = "Inactive: breach in rules of engagement")]
    InactiveRulesOfEngagement,
}

/// The status attribute an account's user attribute sits under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTier {
    Active,
    Pending,
    Inactive,
}

impl AccountStatus {
    pub fn tier(self) -> StatusTier {
        match self {
            AccountStatus::Approved => StatusTier::Active,
            AccountStatus::PendingApproval
            | AccountStatus::PendingAto
            | AccountStatus::PendingDenied => StatusTier::Pending,
            AccountStatus::InactiveAto
            | AccountStatus::InactiveOptOut
            | AccountStatus::InactiveSecurityRisk
            | AccountStatus::InactiveRulesOfEngagement => StatusTier::Inactive,
        }
    }
}

/// A software asset and the license keys it carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub licenses: Vec<String>,
}

/// A SwID tag reported against a checked-out license.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwidReport {
    pub primary_tag: String,
    pub asset_id: String,
    pub license: String,
    pub account: String,
}
