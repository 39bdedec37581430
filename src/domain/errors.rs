#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    InvalidSchema(String),
    InvalidKey { column: usize, value: String },
    TableNotFound(String),
    Csv(String),
    Io(String),
    Serialization(String),
    Clipboard(String),
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainError::InvalidSchema(msg) => {
                write!(f, "Invalid schema: {}", msg)
            }
            DomainError::InvalidKey { column, value } => {
                write!(f, "Invalid key '{}' in column {}", value, column)
            }
            DomainError::TableNotFound(name) => {
                write!(f, "Table not found: {}", name)
            }
            DomainError::Csv(msg) => {
                write!(f, "CSV error: {}", msg)
            }
            DomainError::Io(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            DomainError::Serialization(msg) => {
                write!(f, "Serialization failed: {}", msg)
            }
            DomainError::Clipboard(msg) => {
                write!(f, "Clipboard unavailable: {}", msg)
            }
        }
    }
}

impl std::error::Error for DomainError {}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

impl From<csv::Error> for DomainError {
    fn from(err: csv::Error) -> Self {
        DomainError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
