use crate::{
    component::ComponentError,
    structured::{ParseError, StructuredError, ValueError},
    BoxError,
};
use miette::Diagnostic;
use thiserror::Error;

/// Boundary error of the crate
///
/// Every failure mode maps onto exactly one of these variants. Sign and
/// verify never produce partial results.
#[derive(Debug, Diagnostic, Error)]
pub enum Error {
    #[error("invalid structured header")]
    InvalidStructuredHeader(#[source] BoxError),

    #[error("missing component: {0}")]
    MissingComponent(String),

    #[error("duplicate component: {0}")]
    DuplicateComponent(String),

    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("key error")]
    KeyError(#[source] BoxError),

    #[error("cryptographic operation failed")]
    CryptoError,

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("missing parameter: {0}")]
    MissingParameter(String),

    #[error("forbidden parameter: {0}")]
    ForbiddenParameter(String),

    #[error("signature label is ambiguous")]
    AmbiguousLabel,

    #[error("signature creation timestamp lies in the future")]
    FutureSignature,

    #[error("signature exceeds the maximum age")]
    TooOld,

    #[error("signature is expired")]
    Expired,

    #[error("digest mismatch")]
    Mismatch,
}

impl Error {
    pub(crate) fn malformed(reason: &'static str) -> Self {
        Self::InvalidStructuredHeader(Box::new(Malformed(reason)))
    }

    pub(crate) fn key(source: impl Into<BoxError>) -> Self {
        Self::KeyError(source.into())
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Malformed(&'static str);

impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::InvalidStructuredHeader(Box::new(value))
    }
}

impl From<ValueError> for Error {
    fn from(value: ValueError) -> Self {
        Self::InvalidStructuredHeader(Box::new(value))
    }
}

impl From<StructuredError> for Error {
    fn from(value: StructuredError) -> Self {
        Self::InvalidStructuredHeader(Box::new(value))
    }
}

impl From<ComponentError> for Error {
    fn from(value: ComponentError) -> Self {
        Self::InvalidStructuredHeader(Box::new(value))
    }
}
