use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Rejected operation input; memory and storage are untouched.
    InvalidInput(String),
    /// Malformed persisted data.
    Corrupted(String),
    /// Persistence adapter I/O failure. From a mutating store operation
    /// this means the change was applied in memory but not saved.
    Storage(String),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn corrupted<M: Into<String>>(message: M) -> Self {
        Self::Corrupted(message.into())
    }

    pub fn storage<M: Into<String>>(message: M) -> Self {
        Self::Storage(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Corrupted(_) => "corrupted_data",
            Self::Storage(_) => "storage_error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput(message) => message,
            Self::Corrupted(message) => message,
            Self::Storage(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
