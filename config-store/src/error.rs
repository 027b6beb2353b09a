use thiserror::Error;

/// Broad category of a [`StoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection parameters are missing or a path cannot be used.
    Initialization,
    /// The remote store could not be reached or rejected the request.
    Transport,
    /// The remote store answered with a document that could not be read.
    Parse,
    /// The data read does not belong to the version that was requested.
    Consistency,
    /// A secret value is not a string.
    Type,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("missing configuration: set one of the following environment variables: {}", .vars.join(", "))]
    MissingEnv { vars: Vec<&'static str> },

    #[error("invalid secret path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("token contains characters that cannot be sent in a header")]
    InvalidToken,

    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to create client for {address}")]
    Client {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {path} failed")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{path} returned {status}{}", format_remote_errors(.errors))]
    Status {
        path: String,
        status: u16,
        errors: Vec<String>,
    },

    #[error("failed to decode response from {path}")]
    Decode {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no current_version in metadata at {path}")]
    MissingVersion { path: String },

    #[error("version at {path} is not a version number: {value}")]
    InvalidVersion { path: String, value: String },

    #[error("no data document at {path}")]
    MissingData { path: String },

    #[error("{path} returned version {reported}, expected {requested}")]
    VersionMismatch {
        path: String,
        requested: u64,
        reported: u64,
    },

    #[error("value of {key:?} at {path} is not a string")]
    NonStringValue { path: String, key: String },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MissingEnv { .. }
            | StoreError::InvalidPath { .. }
            | StoreError::InvalidToken => ErrorKind::Initialization,
            StoreError::InvalidAddress { .. }
            | StoreError::Client { .. }
            | StoreError::Request { .. }
            | StoreError::Status { .. } => ErrorKind::Transport,
            StoreError::Decode { .. }
            | StoreError::MissingVersion { .. }
            | StoreError::InvalidVersion { .. }
            | StoreError::MissingData { .. } => ErrorKind::Parse,
            StoreError::VersionMismatch { .. } => ErrorKind::Consistency,
            StoreError::NonStringValue { .. } => ErrorKind::Type,
        }
    }

    /// Remote path the failing request addressed, if the error came from a request.
    pub fn path(&self) -> Option<&str> {
        match self {
            StoreError::Request { path, .. }
            | StoreError::Status { path, .. }
            | StoreError::Decode { path, .. }
            | StoreError::MissingVersion { path }
            | StoreError::InvalidVersion { path, .. }
            | StoreError::MissingData { path }
            | StoreError::VersionMismatch { path, .. }
            | StoreError::NonStringValue { path, .. } => Some(path),
            StoreError::MissingEnv { .. }
            | StoreError::InvalidPath { .. }
            | StoreError::InvalidToken
            | StoreError::InvalidAddress { .. }
            | StoreError::Client { .. } => None,
        }
    }
}

fn format_remote_errors(errors: &[String]) -> String {
    if errors.is_empty() {
        String::new()
    } else {
        format!(": {}", errors.join("; "))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
