use thiserror::Error;

/// Everything that can go wrong while initializing or querying [`crate::Args`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The user asked for help (`--help`/`-h`). Not a failure; carries the usage text.
    #[error("usage requested")]
    UsageRequested(String),

    /// Initialization rejected the command line.
    #[error("{message}")]
    Validation { message: String, usage: String },

    /// A value-bearing flag was given without a value.
    #[error("no value specified for {0}")]
    MissingValue(String),

    #[error("flag query empty")]
    EmptyFlagName,

    #[error("{0} was not specified")]
    NotSpecified(String),

    #[error("could not convert '{value}' to {target}")]
    InvalidValue { value: String, target: &'static str },

    #[error("'{value}' is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("nonflag at index {index} not specified ({count} given)")]
    NonFlagIndex { index: usize, count: usize },
}

impl Error {
    /// Whether this is a help request rather than a failure.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::UsageRequested(_))
    }

    /// Usage text carried by initialization errors.
    pub fn usage(&self) -> Option<&str> {
        match self {
            Self::UsageRequested(usage) | Self::Validation { usage, .. } => Some(usage.as_str()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
