use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One registered user. The key of the users map (a normalized email)
/// doubles as the storage partition key for that user's portfolio.
///
/// `secret_hash` is a plain FNV-1a digest used for an equality check at
/// sign-in. It is NOT a security-grade credential scheme — this record
/// only exists to derive the partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(secret_hash: String) -> Self {
        Self {
            secret_hash,
            created_at: Utc::now(),
        }
    }
}
