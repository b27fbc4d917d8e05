use super::{
    parse::{decode_base64, decode_spki, KeyParseError},
    SignatureAlgorithm,
};
use crate::Error;
use ring::{
    hmac,
    signature::{
        UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_FIXED,
        ECDSA_P384_SHA384_FIXED, ED25519, RSA_PKCS1_2048_8192_SHA256, RSA_PSS_2048_8192_SHA512,
    },
};

/// Key material used to verify a signature
///
/// For asymmetric algorithms this is the raw subject public key; for
/// `hmac-sha256` it is the shared secret.
pub struct VerificationKey {
    algorithm: SignatureAlgorithm,
    material: Material,
}

enum Material {
    Asymmetric(Vec<u8>),
    Hmac(hmac::Key),
}

impl VerificationKey {
    /// Decode an X.509 `SubjectPublicKeyInfo` DER document
    pub fn from_spki_der(algorithm: SignatureAlgorithm, der: &[u8]) -> Result<Self, Error> {
        Ok(Self {
            algorithm,
            material: Material::Asymmetric(decode_spki(algorithm, der)?),
        })
    }

    pub fn from_spki_base64(algorithm: SignatureAlgorithm, encoded: &str) -> Result<Self, Error> {
        Self::from_spki_der(algorithm, &decode_base64(encoded)?)
    }

    /// Wrap raw key material the primitive understands directly: a PKCS#1
    /// modulus for RSA, an uncompressed curve point for ECDSA, 32 bytes for
    /// Ed25519, or the shared secret for HMAC
    #[must_use]
    pub fn from_raw(algorithm: SignatureAlgorithm, material: Vec<u8>) -> Self {
        let material = match algorithm {
            SignatureAlgorithm::HmacSha256 => {
                Material::Hmac(hmac::Key::new(hmac::HMAC_SHA256, &material))
            }
            _ => Material::Asymmetric(material),
        };

        Self {
            algorithm,
            material,
        }
    }

    #[must_use]
    pub fn hmac_from_raw(secret: &[u8]) -> Self {
        Self::from_raw(SignatureAlgorithm::HmacSha256, secret.to_vec())
    }

    pub fn hmac_from_base64(encoded: &str) -> Result<Self, Error> {
        Ok(Self::hmac_from_raw(&decode_base64(encoded)?))
    }

    #[must_use]
    pub fn algorithm(&self) -> SignatureAlgorithm {
        self.algorithm
    }

    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), Error> {
        match &self.material {
            Material::Asymmetric(material) => {
                let algorithm = verification_algorithm(self.algorithm)?;
                UnparsedPublicKey::new(algorithm, material)
                    .verify(message, signature)
                    .map_err(|_| Error::InvalidSignature)
            }
            Material::Hmac(key) => {
                hmac::verify(key, message, signature).map_err(|_| Error::InvalidSignature)
            }
        }
    }
}

fn verification_algorithm(
    algorithm: SignatureAlgorithm,
) -> Result<&'static dyn VerificationAlgorithm, Error> {
    let algorithm: &'static dyn VerificationAlgorithm = match algorithm {
        SignatureAlgorithm::RsaV1_5Sha256 => &RSA_PKCS1_2048_8192_SHA256,
        SignatureAlgorithm::RsaPssSha512 => &RSA_PSS_2048_8192_SHA512,
        SignatureAlgorithm::EcdsaP256Sha256 => &ECDSA_P256_SHA256_FIXED,
        SignatureAlgorithm::EcdsaP384Sha384 => &ECDSA_P384_SHA384_FIXED,
        SignatureAlgorithm::Ed25519 => &ED25519,
        SignatureAlgorithm::HmacSha256 => {
            return Err(Error::key(KeyParseError::UnsupportedEncoding))
        }
    };

    Ok(algorithm)
}
