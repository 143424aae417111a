use thiserror::Error;

/// Unified error type for the entire networth-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── User input ──────────────────────────────────────────────────
    #[error("Invalid asset input: {0}")]
    InvalidAssetInput(String),

    /// A second submission of the same logical add-asset action arrived
    /// while the first was still in flight. Callers discard this silently.
    #[error("Duplicate submission — an identical action is already in flight")]
    DuplicateSubmission,

    // ── Identity ────────────────────────────────────────────────────
    #[error("An account already exists for {0}")]
    AlreadyExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    // ── Quotes ──────────────────────────────────────────────────────
    /// Every configured source failed for this symbol. Never a zero price —
    /// callers must leave the asset untouched.
    #[error("No quote available for {symbol} ({asset_class})")]
    QuoteUnavailable {
        symbol: String,
        asset_class: String,
    },

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Persistence ─────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid backup document: {0}")]
    InvalidBackup(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Network(e.to_string())
    }
}
