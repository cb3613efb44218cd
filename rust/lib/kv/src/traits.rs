use crate::error::KVError;

/// KVStore is the byte-oriented storage interface the policy engine persists
/// through.
///
/// Keys are namespaced strings, e.g. `ngac:blossom:graph` or
/// `ngac:Org2MSP:obligations`. Values are opaque bytes.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Write several keys in one transaction: either all land or none do.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
