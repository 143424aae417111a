use log::warn;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;
use crate::models::user::UserRecord;

use super::store::KeyValueStore;

const USERS_KEY: &str = "users";
const ACTIVE_USER_KEY: &str = "active_user";

fn portfolio_key(user_key: &str) -> String {
    format!("portfolio:{user_key}")
}

/// Per-user keyed persistence of portfolios, the users map, and the
/// active-user pointer, over the injected key-value substrate.
///
/// Records are self-describing JSON. A malformed stored record is
/// logged and treated as absent — corrupt persistence degrades to the
/// empty default instead of crashing or surfacing an error.
#[derive(Clone)]
pub struct PortfolioStore {
    store: Arc<dyn KeyValueStore>,
}

impl PortfolioStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the portfolio stored under `user_key`, or a fresh empty one
    /// (all categories present) if none exists. Never another user's
    /// data — the key is the partition.
    pub fn load(&self, user_key: &str) -> Portfolio {
        match self.store.get(&portfolio_key(user_key)) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(portfolio) => portfolio,
                Err(e) => {
                    warn!("Corrupt portfolio record for {user_key}, starting empty: {e}");
                    Portfolio::default()
                }
            },
            Ok(None) => Portfolio::default(),
            Err(e) => {
                warn!("Failed to read portfolio for {user_key}, starting empty: {e}");
                Portfolio::default()
            }
        }
    }

    /// Serialize and overwrite the full portfolio for `user_key`.
    /// Last-writer-wins, no merge.
    pub fn save(&self, user_key: &str, portfolio: &Portfolio) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(portfolio)?;
        self.store.set(&portfolio_key(user_key), &bytes)
    }

    /// The registered users map. Corrupt or missing → empty.
    pub fn load_users(&self) -> BTreeMap<String, UserRecord> {
        match self.store.get(USERS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(users) => users,
                Err(e) => {
                    warn!("Corrupt users record, treating as empty: {e}");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read users record, treating as empty: {e}");
                BTreeMap::new()
            }
        }
    }

    pub fn save_users(&self, users: &BTreeMap<String, UserRecord>) -> Result<(), CoreError> {
        let bytes = serde_json::to_vec(users)?;
        self.store.set(USERS_KEY, &bytes)
    }

    /// The persisted active-user pointer, if any.
    pub fn load_active_user(&self) -> Option<String> {
        match self.store.get(ACTIVE_USER_KEY) {
            Ok(Some(bytes)) => serde_json::from_slice(&bytes).ok(),
            _ => None,
        }
    }

    pub fn save_active_user(&self, user_key: Option<&str>) -> Result<(), CoreError> {
        match user_key {
            Some(key) => {
                let bytes = serde_json::to_vec(key)?;
                self.store.set(ACTIVE_USER_KEY, &bytes)
            }
            None => self.store.remove(ACTIVE_USER_KEY),
        }
    }
}
