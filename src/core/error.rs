//! Error type shared across the library.
//!
//! Expected network failures (fetch errors, DNS misses, SMTP disconnects) are
//! not errors here: the leaf components report them as typed outcomes and the
//! callers fold them into their decisions. `AppError` covers rejected input,
//! configuration problems and genuinely unexpected conditions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed domain or address, or a required name is missing.
    /// Raised before any network access happens.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid email pattern template: {0}")]
    InvalidPattern(String),

    #[error("Could not extract domain: {0}")]
    DomainExtraction(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("SMTP check inconclusive: {0}")]
    SmtpInconclusive(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
