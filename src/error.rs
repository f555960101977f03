use thiserror::Error;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Input file does not exist: {0:?}")]
    MissingInput(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Duplicate term {term:?} on line {line} (first seen on line {first_line})")]
    DuplicateTerm {
        term: String,
        first_line: usize,
        line: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },

    #[error("Cache integrity error: {0}")]
    CacheIntegrity(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Distance matrix format error: {0}")]
    MatrixFormat(String),

    #[error("Distance {distance} between {left:?} and {right:?} does not fit in a signed byte")]
    Representation {
        distance: usize,
        left: String,
        right: String,
    },

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn cache<S: Into<String>>(msg: S) -> Self {
        Error::CacheIntegrity(msg.into())
    }

    pub fn matrix<S: Into<String>>(msg: S) -> Self {
        Error::MatrixFormat(msg.into())
    }

    pub fn parameter<S: Into<String>>(name: &'static str, message: S) -> Self {
        Error::InvalidParameter { name, message: message.into() }
    }

    /// Errors caused by what the user handed us, as opposed to failures
    /// while processing it.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Error::MissingInput(_)
                | Error::InvalidArgument(_)
                | Error::DuplicateTerm { .. }
                | Error::InvalidParameter { .. }
        )
    }

    /// Process exit code for this error: 2 for input errors, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_input() { 2 } else { 1 }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Error::ThreadPool(format!("Thread pool build failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_exit_with_two() {
        assert_eq!(Error::input("bad").exit_code(), 2);
        assert_eq!(Error::MissingInput(PathBuf::from("x")).exit_code(), 2);
        let dup = Error::DuplicateTerm { term: "a".into(), first_line: 1, line: 3 };
        assert!(dup.is_input());
        assert_eq!(Error::cache("corrupt").exit_code(), 1);
    }

    #[test]
    fn duplicate_message_names_both_lines() {
        let dup = Error::DuplicateTerm { term: "abc".into(), first_line: 2, line: 7 };
        let msg = dup.to_string();
        assert!(msg.contains("\"abc\""));
        assert!(msg.contains("line 7"));
        assert!(msg.contains("line 2"));
    }
}
