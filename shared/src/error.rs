use thiserror::Error;

/// Errors raised by the course crate.
///
/// Shape errors are configuration bugs: they abort creation of the entity that
/// triggered them and are never retried.
#[derive(Debug, Error)]
pub enum CourseError {
    #[error("visual type not recognized: {kind}")]
    UnsupportedShape { kind: String },

    #[error("compound shapes cannot contain a {kind} child")]
    InvalidCompoundChild { kind: &'static str },

    #[error("compound shape has no children")]
    EmptyCompound,

    #[error("{0} body was not registered")]
    NotRegistered(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CourseError>;
