//! Account entity

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i32,

    pub username: String,

    /// Hex SHA-256 digest of the secret; never leaves the process
    #[serde(skip_serializing)]
    pub credential_hash: String,
}

/// Input for creating an account
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub username: String,
    pub secret: String,
}

/// Hash a secret credential for storage
pub fn hash_credential(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
