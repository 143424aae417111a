use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::asset::{Asset, Category};
use crate::models::portfolio::Portfolio;

/// Current backup document version.
pub const BACKUP_VERSION: u16 = 1;

/// Self-describing snapshot of one user's assets, suitable for export
/// to a file and re-import later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub version: u16,
    pub export_date: DateTime<Utc>,
    pub assets: BTreeMap<Category, Vec<Asset>>,
}

/// Serialize a portfolio into a backup document.
pub fn write_backup(portfolio: &Portfolio) -> Result<String, CoreError> {
    let snapshot = BackupSnapshot {
        version: BACKUP_VERSION,
        export_date: Utc::now(),
        assets: portfolio.assets.clone(),
    };
    serde_json::to_string_pretty(&snapshot)
        .map_err(|e| CoreError::Serialization(format!("Failed to serialize backup: {e}")))
}

/// Parse and validate a backup document.
///
/// Required top-level fields are checked on the raw JSON first, so a
/// truncated or foreign document is rejected before any state is
/// overwritten.
pub fn read_backup(json: &str) -> Result<BackupSnapshot, CoreError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| CoreError::InvalidBackup(format!("Not valid JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| CoreError::InvalidBackup("Top level must be an object".into()))?;
    for field in ["version", "export_date", "assets"] {
        if !obj.contains_key(field) {
            return Err(CoreError::InvalidBackup(format!(
                "Missing required field '{field}'"
            )));
        }
    }

    let snapshot: BackupSnapshot = serde_json::from_value(value)
        .map_err(|e| CoreError::InvalidBackup(format!("Malformed backup document: {e}")))?;

    if snapshot.version == 0 || snapshot.version > BACKUP_VERSION {
        return Err(CoreError::InvalidBackup(format!(
            "Unsupported backup version {}",
            snapshot.version
        )));
    }

    Ok(snapshot)
}

/// Build a portfolio from a validated snapshot, restoring any missing
/// category keys.
pub fn restore_portfolio(snapshot: BackupSnapshot) -> Portfolio {
    let mut portfolio = Portfolio {
        assets: snapshot.assets,
        last_sync: None,
    };
    for category in Category::ALL {
        portfolio.assets.entry(category).or_default();
    }
    portfolio
}
