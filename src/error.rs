use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("backend request failed: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("{title}: {message}")]
    Validation { title: String, message: String },

    #[error("Authentication Error: {0}")]
    NotAuthenticated(String),

    #[error("session file {path}: {source}")]
    Session {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session file is not valid JSON: {0}")]
    SessionFormat(#[from] serde_json::Error),

    #[error("unexpected row shape: {0}")]
    Decode(String),
}

impl CatalogError {
    pub fn validation(title: impl Into<String>, message: impl Into<String>) -> Self {
        CatalogError::Validation {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Short message suitable for a one-line user notification.
    pub fn notification(&self) -> String {
        match self {
            CatalogError::Validation { message, .. } => message.clone(),
            CatalogError::NotAuthenticated(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_notification_is_message_only() {
        let err = CatalogError::validation("Invalid Price", "Price must be a non-negative number.");
        assert_eq!(err.notification(), "Price must be a non-negative number.");
        assert_eq!(
            err.to_string(),
            "Invalid Price: Price must be a non-negative number."
        );
    }
}
