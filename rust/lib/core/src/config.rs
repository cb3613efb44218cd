use std::path::PathBuf;

pub const DEFAULT_ADMIN_PRINCIPAL: &str = "Org1 Admin:Org1MSP";
pub const DEFAULT_SHARED_PARTITION: &str = "blossom";

/// Server configuration.
///
/// `blossomd` fills this from its command line; tests and embedders use
/// struct update syntax over `Default`.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding the policy database.
    pub data_dir: Option<PathBuf>,

    /// Path to the redb database file.
    /// Defaults to `{data_dir}/ngac.redb` if not specified.
    pub db_path: Option<PathBuf>,

    /// Listen address for the HTTP server.
    pub listen: String,

    /// Principal (`commonName:mspID`) that administers the base policy.
    pub admin_principal: String,

    /// Partition holding the policy shared by every tenant.
    pub shared_partition: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            db_path: None,
            listen: "0.0.0.0:8080".to_string(),
            admin_principal: DEFAULT_ADMIN_PRINCIPAL.to_string(),
            shared_partition: DEFAULT_SHARED_PARTITION.to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve the redb database path, falling back to `{data_dir}/ngac.redb`.
    pub fn resolve_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.resolve_data_subpath("ngac.redb"))
    }

    fn resolve_data_subpath(&self, name: &str) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(|d| d.join(name))
            .unwrap_or_else(|| PathBuf::from(name))
    }
}
