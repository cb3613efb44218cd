use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard granting every operation.
pub const ALL_OPS: &str = "*";

/// Administrative operations checked when mutating the graph.
pub mod admin {
    pub const CREATE_NODE: &str = "create node";
    pub const DELETE_NODE: &str = "delete node";
    pub const ASSIGN: &str = "assign";
    pub const ASSIGN_TO: &str = "assign to";
    pub const DEASSIGN: &str = "deassign";
    pub const DEASSIGN_FROM: &str = "deassign from";
    pub const ASSOCIATE: &str = "associate";
    pub const DISSOCIATE: &str = "dissociate";
}

/// Resource operations on accounts, assets, licenses and SwIDs.
pub mod resource {
    pub const VIEW_ASSET: &str = "view_asset";
    pub const VIEW_LICENSE: &str = "view_license";
    pub const VIEW_AVAILABLE_LICENSES: &str = "view_available_licenses";
    pub const VIEW_CHECKED_OUT: &str = "view_checked_out";
    pub const VIEW_ALL_LICENSES: &str = "view_all_licenses";
    pub const CHECKOUT: &str = "checkout";
    pub const CHECKIN: &str = "checkin";
    pub const ONBOARD_ASSET: &str = "onboard_asset";
    pub const OFFBOARD_ASSET: &str = "offboard_asset";

    pub const VIEW_ACCOUNT: &str = "view_account";
    pub const VIEW_ATO: &str = "view_ato";
    pub const VIEW_MSPID: &str = "view_mspid";
    pub const VIEW_USERS: &str = "view_users";
    pub const VIEW_ACCOUNT_LICENSES: &str = "view_account_licenses";
    pub const VIEW_STATUS: &str = "view_status";
    pub const UPDATE_ACCOUNT_STATUS: &str = "update_account_status";
    pub const UPLOAD_ATO: &str = "upload_ato";
    pub const REMOVE_ACCOUNT: &str = "remove_account";

    pub const VIEW_SWID: &str = "view_swid";
    pub const REPORT_SWID: &str = "report_swid";

    pub const INIT_BLOSSOM: &str = "init_blossom";
}

/// Every operation name the engine defines, `*` excluded.
pub const KNOWN_OPS: &[&str] = &[
    admin::CREATE_NODE,
    admin::DELETE_NODE,
    admin::ASSIGN,
    admin::ASSIGN_TO,
    admin::DEASSIGN,
    admin::DEASSIGN_FROM,
    admin::ASSOCIATE,
    admin::DISSOCIATE,
    resource::VIEW_ASSET,
    resource::VIEW_LICENSE,
    resource::VIEW_AVAILABLE_LICENSES,
    resource::VIEW_CHECKED_OUT,
    resource::VIEW_ALL_LICENSES,
    resource::CHECKOUT,
    resource::CHECKIN,
    resource::ONBOARD_ASSET,
    resource::OFFBOARD_ASSET,
    resource::VIEW_ACCOUNT,
    resource::VIEW_ATO,
    resource::VIEW_MSPID,
    resource::VIEW_USERS,
    resource::VIEW_ACCOUNT_LICENSES,
    resource::VIEW_STATUS,
    resource::UPDATE_ACCOUNT_STATUS,
    resource::UPLOAD_ATO,
    resource::REMOVE_ACCOUNT,
    resource::VIEW_SWID,
    resource::REPORT_SWID,
    resource::INIT_BLOSSOM,
];

/// A set of operation names, kept sorted for stable serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operations(BTreeSet<String>);

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self::from_iter([ALL_OPS])
    }

    pub fn insert(&mut self, op: impl Into<String>) -> bool {
        self.0.insert(op.into())
    }

    pub fn extend(&mut self, other: &Operations) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn contains(&self, op: &str) -> bool {
        self.0.contains(op)
    }

    /// Whether `op` is granted, honoring the `*` wildcard.
    pub fn allows(&self, op: &str) -> bool {
        self.contains(ALL_OPS) || self.contains(op)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Remove every operation in `denied`. Denying `*` clears the set.
    ///
    /// A `*` that loses some operations no longer stands for everything: it
    /// is replaced by [`KNOWN_OPS`] before the denied names are removed, so
    /// the result never `allows` a denied operation.
    pub fn subtract(&mut self, denied: &Operations) {
        if denied.is_empty() {
            return;
        }
        if denied.contains(ALL_OPS) {
            self.0.clear();
            return;
        }
        if self.0.remove(ALL_OPS) {
            self.0.extend(KNOWN_OPS.iter().map(|op| op.to_string()));
        }
        self.0.retain(|op| !denied.contains(op));
    }
}

impl<S: Into<String>> FromIterator<S> for Operations {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Operations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ops: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", ops.join(", "))
    }
}
