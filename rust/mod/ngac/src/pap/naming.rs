//! Node names derived from domain identifiers.

pub const BLOSSOM_PC: &str = "blossom_PC";
pub const BLOSSOM_OBJECT: &str = "blossom";
pub const BLOSSOM_OA: &str = "blossom_OA";

pub mod rbac {
    pub const PC: &str = "RBAC";
    pub const UA: &str = "RBAC_UA";
    pub const OA: &str = "RBAC_OA";
    pub const ACCOUNTS_UA: &str = "Accounts_UA";
    pub const SYSTEM_OWNER: &str = "SystemOwner";
    pub const SYSTEM_ADMINISTRATOR: &str = "SystemAdministrator";
    pub const ACQUISITION_SPECIALIST: &str = "AcquisitionSpecialist";
    pub const ACCOUNTS_OA: &str = "Accounts";
    pub const ASSETS_OA: &str = "Assets";
    pub const SWIDS_OA: &str = "SwIDs";
}

pub mod dac {
    pub const PC: &str = "DAC";
    pub const UA: &str = "DAC_UA";
    pub const OA: &str = "DAC_OA";
    pub const ASSETS_OA: &str = "dac_assets";
}

pub mod status {
    pub const PC: &str = "Status";
    pub const UA: &str = "Status_UA";
    pub const OA: &str = "Status_OA";
    pub const ACCOUNTS_OA: &str = "status_accounts_OA";
    pub const ASSETS_OA: &str = "status_assets_OA";
    pub const SWIDS_OA: &str = "status_swids_OA";
    pub const ACTIVE: &str = "active";
    pub const PENDING: &str = "pending";
    pub const INACTIVE: &str = "inactive";
}

/// `commonName:mspID`, the principal string of a user.
pub fn username(common_name: &str, mspid: &str) -> String {
    format!("{}:{}", common_name, mspid)
}

/// User attribute grouping a principal's grants, e.g. the administrator's.
pub fn user_attribute(principal: &str) -> String {
    format!("{}_UA", principal)
}

pub fn account_ua(account: &str) -> String {
    format!("{}_UA", account)
}

pub fn account_oa(account: &str) -> String {
    format!("{}_OA", account)
}

pub fn account_info(account: &str) -> String {
    format!("{}_info", account)
}

pub fn account_assets_oa(account: &str) -> String {
    format!("{} assets", account)
}

pub fn asset_oa(asset_id: &str) -> String {
    asset_id.to_string()
}

pub fn license_object(asset_id: &str, license: &str) -> String {
    format!("{}:{}", asset_id, license)
}

pub fn swid_oa(primary_tag: &str) -> String {
    primary_tag.to_string()
}
