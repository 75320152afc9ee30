use thiserror::Error;

/// Errors raised while loading settings or parsing domain names.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A setting is present but unusable, such as an unknown timezone.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A draft type, status or update category name is not recognised.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
