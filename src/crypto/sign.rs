use super::{
    parse::{decode_base64, KeyParseError},
    SignatureAlgorithm,
};
use crate::Error;
use ring::{
    hmac,
    rand::SystemRandom,
    signature::{
        EcdsaKeyPair, Ed25519KeyPair, RsaEncoding, RsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
        ECDSA_P384_SHA384_FIXED_SIGNING, RSA_PKCS1_SHA256, RSA_PSS_SHA512,
    },
};

/// A private (or shared, for MAC algorithms) signing key
///
/// Already-decoded ring key pairs can be wrapped directly through the enum
/// variants; the constructors cover DER and base64-encoded DER input.
pub enum SigningKey {
    RsaV1_5Sha256(RsaKeyPair),
    RsaPssSha512(RsaKeyPair),
    EcdsaP256Sha256(EcdsaKeyPair),
    EcdsaP384Sha384(EcdsaKeyPair),
    Ed25519(Ed25519KeyPair),
    HmacSha256(hmac::Key),
}

impl SigningKey {
    /// Decode a PKCS#8 DER private key for the given algorithm
    ///
    /// RSA keys are additionally accepted in PKCS#1 `RSAPrivateKey` form.
    pub fn from_pkcs8_der(algorithm: SignatureAlgorithm, der: &[u8]) -> Result<Self, Error> {
        let key = match algorithm {
            SignatureAlgorithm::RsaV1_5Sha256 => Self::RsaV1_5Sha256(rsa_key_pair(der)?),
            SignatureAlgorithm::RsaPssSha512 => Self::RsaPssSha512(rsa_key_pair(der)?),
            SignatureAlgorithm::EcdsaP256Sha256 => Self::EcdsaP256Sha256(
                EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, der, &SystemRandom::new())
                    .map_err(Error::key)?,
            ),
            SignatureAlgorithm::EcdsaP384Sha384 => Self::EcdsaP384Sha384(
                EcdsaKeyPair::from_pkcs8(&ECDSA_P384_SHA384_FIXED_SIGNING, der, &SystemRandom::new())
                    .map_err(Error::key)?,
            ),
            SignatureAlgorithm::Ed25519 => Self::Ed25519(
                Ed25519KeyPair::from_pkcs8_maybe_unchecked(der).map_err(Error::key)?,
            ),
            SignatureAlgorithm::HmacSha256 => {
                return Err(Error::key(KeyParseError::UnsupportedEncoding))
            }
        };

        Ok(key)
    }

    pub fn from_pkcs8_base64(
        algorithm: SignatureAlgorithm,
        encoded: &str,
    ) -> Result<Self, Error> {
        Self::from_pkcs8_der(algorithm, &decode_base64(encoded)?)
    }

    pub fn hmac_from_raw(secret: &[u8]) -> Self {
        Self::HmacSha256(hmac::Key::new(hmac::HMAC_SHA256, secret))
    }

    pub fn hmac_from_base64(encoded: &str) -> Result<Self, Error> {
        Ok(Self::hmac_from_raw(&decode_base64(encoded)?))
    }

    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        match self {
            Self::RsaV1_5Sha256(..) => SignatureAlgorithm::RsaV1_5Sha256,
            Self::RsaPssSha512(..) => SignatureAlgorithm::RsaPssSha512,
            Self::EcdsaP256Sha256(..) => SignatureAlgorithm::EcdsaP256Sha256,
            Self::EcdsaP384Sha384(..) => SignatureAlgorithm::EcdsaP384Sha384,
            Self::Ed25519(..) => SignatureAlgorithm::Ed25519,
            Self::HmacSha256(..) => SignatureAlgorithm::HmacSha256,
        }
    }

    /// Sign the message, returning the signature in its wire form
    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let signature = match self {
            Self::RsaV1_5Sha256(key) => rsa_sign(key, &RSA_PKCS1_SHA256, message)?,
            Self::RsaPssSha512(key) => rsa_sign(key, &RSA_PSS_SHA512, message)?,
            Self::EcdsaP256Sha256(key) | Self::EcdsaP384Sha384(key) => key
                .sign(&SystemRandom::new(), message)
                .map_err(|_| Error::CryptoError)?
                .as_ref()
                .to_vec(),
            Self::Ed25519(key) => key.sign(message).as_ref().to_vec(),
            Self::HmacSha256(key) => hmac::sign(key, message).as_ref().to_vec(),
        };

        Ok(signature)
    }
}

fn rsa_key_pair(der: &[u8]) -> Result<RsaKeyPair, Error> {
    RsaKeyPair::from_pkcs8(der)
        .or_else(|_| RsaKeyPair::from_der(der))
        .map_err(Error::key)
}

fn rsa_sign(
    key: &RsaKeyPair,
    padding: &'static dyn RsaEncoding,
    message: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut signature = vec![0; key.public().modulus_len()];
    key.sign(padding, &SystemRandom::new(), message, &mut signature)
        .map_err(|_| Error::CryptoError)?;

    Ok(signature)
}
