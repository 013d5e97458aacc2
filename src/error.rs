//! Error handling for the application

use crate::access::{Permission, Role};

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Access denied: {role} lacks {permission}")]
    PermissionDenied { role: Role, permission: Permission },

    #[error("Unknown user: {0}")]
    UnknownUser(u32),

    #[error("Store error: {0}")]
    Store(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Denials are shown to the user rather than treated as failures
    pub fn is_denial(&self) -> bool {
        matches!(self, AppError::PermissionDenied { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
