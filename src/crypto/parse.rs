use super::SignatureAlgorithm;
use crate::Error;
use const_oid::db::{
    rfc5912::{ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1},
    rfc8410::ID_ED_25519,
};
use miette::Diagnostic;
use pkcs8::der::Decode;
use pkcs8::{Document, SubjectPublicKeyInfoRef};
use thiserror::Error as ThisError;

#[derive(Debug, Diagnostic, ThisError)]
pub enum KeyParseError {
    #[error(transparent)]
    Base64(#[from] base64_simd::Error),

    #[error(transparent)]
    Der(#[from] pkcs8::der::Error),

    #[error("malformed key")]
    MalformedKey,

    #[error("key does not match the requested algorithm")]
    AlgorithmMismatch,

    #[error("algorithm does not take this key encoding")]
    UnsupportedEncoding,
}

pub(crate) fn decode_base64(encoded: &str) -> Result<Vec<u8>, Error> {
    base64_simd::STANDARD
        .decode_to_vec(encoded)
        .map_err(|err| Error::key(KeyParseError::from(err)))
}

/// Unwrap a DER `SubjectPublicKeyInfo` into the raw key material the
/// verification primitive expects, cross-checking the embedded OIDs against
/// the requested algorithm
pub(crate) fn decode_spki(algorithm: SignatureAlgorithm, der: &[u8]) -> Result<Vec<u8>, Error> {
    let document = Document::from_der(der).map_err(|err| Error::key(KeyParseError::from(err)))?;
    let spki: SubjectPublicKeyInfoRef<'_> = document
        .decode_msg()
        .map_err(|err| Error::key(KeyParseError::from(err)))?;

    let matches = match algorithm {
        SignatureAlgorithm::RsaV1_5Sha256 | SignatureAlgorithm::RsaPssSha512 => {
            spki.algorithm.oid == RSA_ENCRYPTION
        }
        SignatureAlgorithm::EcdsaP256Sha256 => {
            spki.algorithm.oid == ID_EC_PUBLIC_KEY
                && spki.algorithm.parameters_oid().ok() == Some(SECP_256_R_1)
        }
        SignatureAlgorithm::EcdsaP384Sha384 => {
            spki.algorithm.oid == ID_EC_PUBLIC_KEY
                && spki.algorithm.parameters_oid().ok() == Some(SECP_384_R_1)
        }
        SignatureAlgorithm::Ed25519 => spki.algorithm.oid == ID_ED_25519,
        SignatureAlgorithm::HmacSha256 => {
            return Err(Error::key(KeyParseError::UnsupportedEncoding))
        }
    };

    if !matches {
        return Err(Error::key(KeyParseError::AlgorithmMismatch));
    }

    spki.subject_public_key
        .as_bytes()
        .map(<[u8]>::to_vec)
        .ok_or_else(|| Error::key(KeyParseError::MalformedKey))
}
