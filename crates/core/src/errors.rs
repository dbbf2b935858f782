use thiserror::Error;

use crate::config::ConfigError;

/// Application-level failure taxonomy. Configuration problems are fatal at
/// startup; provider problems are downgraded to defaults at the adapter
/// boundary and only reach this type when a front end needs to report them;
/// persistence problems surface as descriptive text, never panics.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("configuration failure: {0}")]
    Configuration(#[from] ConfigError),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("provider failure: {0}")]
    Provider(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

impl ApplicationError {
    /// Stable class label used in structured CLI outcomes.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Persistence(_) => "persistence",
            Self::Provider(_) => "provider",
            Self::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationError;
    use crate::config::ConfigError;

    #[test]
    fn config_errors_map_to_config_validation_class() {
        let error =
            ApplicationError::from(ConfigError::Validation("missing credential".to_string()));
        assert_eq!(error.class(), "config_validation");
    }

    #[test]
    fn persistence_errors_keep_their_message() {
        let error = ApplicationError::Persistence("database lock timeout".to_string());
        assert_eq!(error.to_string(), "persistence failure: database lock timeout");
    }
}
