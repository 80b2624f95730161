use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all mvn2get operations.
#[derive(Debug, Error, Diagnostic)]
pub enum Mvn2getError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or malformed configuration (flags or `.mvn2get.json`).
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check your .mvn2get.json for syntax errors"))]
    Config { message: String },

    /// An artifact coordinate could not be parsed.
    #[error("Invalid coordinate: {message}")]
    #[diagnostic(help("Coordinates take the form group:artifact:version[:classifier[:packaging]]"))]
    Coordinate { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// A POM or other XML document could not be parsed.
    #[error("XML parse error: {message}")]
    Xml { message: String },

    /// The artifact store could not persist a file.
    #[error("Store error: {message}")]
    Store { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type Mvn2getResult<T> = miette::Result<T>;
