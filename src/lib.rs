//!
//! End-to-end integrity and authenticity for HTTP messages
//!
//! Computes and verifies signatures over a canonicalized selection of
//! message components (HTTP message signatures), and produces/validates
//! content digests, both expressed as RFC 8941 structured field values.
//!
//! Transport, framework adapters, and key management stay outside: callers
//! hand in a [`SignatureContext`] describing the message and get header
//! values back.
//!

#![forbid(rust_2018_idioms, unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

#[macro_use]
extern crate tracing;

use http::HeaderName;

pub mod digest;
pub mod structured;

mod base;
mod component;
mod context;
mod crypto;
mod error;
mod signer;
mod verifier;

mod util;

pub use self::base::{param, CoveredComponent, SignatureBase, SignatureParameters};
pub use self::component::{ComponentError, DerivedComponent, SignatureComponent};
pub use self::context::SignatureContext;
pub use self::crypto::{SignatureAlgorithm, SigningKey, VerificationKey};
pub use self::error::Error;
pub use self::signer::{sign, SignatureSpec, SignedHeaders};
pub use self::verifier::{verify, VerificationSpec};
pub use ring;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub static SIGNATURE_INPUT_HEADER: HeaderName = HeaderName::from_static("signature-input");
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("signature");
pub static CONTENT_DIGEST_HEADER: HeaderName = HeaderName::from_static("content-digest");
pub static WANT_CONTENT_DIGEST_HEADER: HeaderName = HeaderName::from_static("want-content-digest");
