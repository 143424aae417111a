use crate::errors::CoreError;
use crate::models::user::UserRecord;
use crate::storage::portfolio_store::PortfolioStore;

/// Resolves the current-user partition key and manages the registered
/// users map.
///
/// Not a security system: the secret is stored as a plain FNV-1a digest
/// and compared for equality. This module's only real contract is
/// deriving the partition key that isolates one user's portfolio from
/// another's.
pub struct SessionService {
    store: PortfolioStore,
}

impl SessionService {
    pub fn new(store: PortfolioStore) -> Self {
        Self { store }
    }

    /// User keys are trimmed and lowercased so `Alice@Example.com` and
    /// `alice@example.com` land in the same partition.
    pub fn normalize_key(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Register a new user and make their session active. The caller
    /// is expected to load and immediately persist the fresh portfolio
    /// so the record exists before any asset write.
    pub fn sign_up(&self, key: &str, secret: &str) -> Result<String, CoreError> {
        let key = Self::normalize_key(key);
        if key.is_empty() || secret.is_empty() {
            return Err(CoreError::InvalidCredentials);
        }

        let mut users = self.store.load_users();
        if users.contains_key(&key) {
            return Err(CoreError::AlreadyExists(key));
        }

        users.insert(key.clone(), UserRecord::new(hash_secret(secret)));
        self.store.save_users(&users)?;
        self.store.save_active_user(Some(&key))?;
        Ok(key)
    }

    /// Validate credentials and make the session active.
    pub fn sign_in(&self, key: &str, secret: &str) -> Result<String, CoreError> {
        let key = Self::normalize_key(key);
        let users = self.store.load_users();

        let record = users.get(&key).ok_or(CoreError::InvalidCredentials)?;
        if record.secret_hash != hash_secret(secret) {
            return Err(CoreError::InvalidCredentials);
        }

        self.store.save_active_user(Some(&key))?;
        Ok(key)
    }

    /// Clear the active session pointer.
    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.store.save_active_user(None)
    }
}

/// FNV-1a 64-bit digest, hex-encoded. Deterministic equality transform
/// only — explicitly NOT a password-hashing scheme.
fn hash_secret(secret: &str) -> String {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in secret.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    format!("{hash:016x}")
}
