//! Error types for Stockroom operations

use thiserror::Error;

/// Local precondition failures, raised before any remote call is attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("La quantité doit être positive ({field} = {value})")]
    NonPositiveQuantity { field: String, value: i64 },

    #[error("Au moins un article est requis")]
    EmptyBatch,

    #[error("Champ requis manquant: {field}")]
    RequiredFieldMissing { field: String },
}

/// Classification of a remote failure, derived from the message contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteErrorKind {
    /// Not enough stock to satisfy an exit or a restock batch.
    InsufficientStock,
    /// A technician exit was attempted without a technician.
    MissingTechnician,
    /// A member or invitation with this email already exists.
    DuplicateEmail,
    /// The addressed row does not exist.
    NotFound,
    /// The session is missing or not allowed to perform the call.
    Unauthorized,
    /// The request never produced a server answer.
    Transport,
    /// Anything else.
    Other,
}

/// Failure reported by the backend (or by the transport reaching it).
///
/// The message text is part of the contract: callers discriminate error
/// kinds by substring (e.g. "Stock insuffisant").
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub message: String,
    pub code: Option<String>,
    pub status: Option<u16>,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            status: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Transport-level failure (connection refused, timeout, bad body).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(message).with_code("transport")
    }

    pub fn kind(&self) -> RemoteErrorKind {
        let lower = self.message.to_lowercase();
        if lower.contains("stock insuffisant") || lower.contains("insufficient stock") {
            RemoteErrorKind::InsufficientStock
        } else if lower.contains("technicien requis") || lower.contains("technician required") {
            RemoteErrorKind::MissingTechnician
        } else if (lower.contains("déjà") && lower.contains("email"))
            || (lower.contains("duplicate") && lower.contains("email"))
            || self.code.as_deref() == Some("23505")
        {
            RemoteErrorKind::DuplicateEmail
        } else if self.code.as_deref() == Some("transport") {
            RemoteErrorKind::Transport
        } else if matches!(self.status, Some(401) | Some(403)) || self.code.as_deref() == Some("42501")
        {
            RemoteErrorKind::Unauthorized
        } else if self.status == Some(404)
            || self.code.as_deref() == Some("PGRST116")
            || lower.contains("introuvable")
            || lower.contains("not found")
        {
            RemoteErrorKind::NotFound
        } else {
            RemoteErrorKind::Other
        }
    }

    pub fn is_insufficient_stock(&self) -> bool {
        self.kind() == RemoteErrorKind::InsufficientStock
    }
}

/// Local storage errors (cache and persisted preferences).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Serialization failed for {key}: {reason}")]
    Serialization { key: String, reason: String },

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

/// Master error type for all Stockroom errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StockroomError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl StockroomError {
    /// The remote failure behind this error, if any.
    pub fn as_remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for Stockroom operations.
pub type StockroomResult<T> = Result<T, StockroomError>;

// =============================================================================
// TESTS
// =============================================================================
