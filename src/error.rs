/// Errors returned when configuring or combining sketches.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A construction parameter is out of its supported range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Two sketches with different shapes cannot be combined.
    #[error("incompatible merge: {0}")]
    IncompatibleMerge(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub(crate) fn incompatible(
        what: &str,
        ours: impl std::fmt::Display,
        theirs: impl std::fmt::Display,
    ) -> Self {
        Self::IncompatibleMerge(format!("{what} differs: {ours} != {theirs}"))
    }
}
