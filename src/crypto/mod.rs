use strum::{AsRefStr, EnumString};

mod parse;
mod sign;
mod verify;

pub use self::sign::SigningKey;
pub use self::verify::VerificationKey;

/// The closed set of supported signature algorithms
///
/// The string representation is the token used by the `alg` signature
/// parameter.
#[derive(AsRefStr, EnumString, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 over SHA-256
    #[strum(serialize = "rsa-v1_5-sha256")]
    RsaV1_5Sha256,

    /// RSASSA-PSS over SHA-512 (MGF1-SHA-512, 64-byte salt)
    #[strum(serialize = "rsa-pss-sha512")]
    RsaPssSha512,

    /// ECDSA on P-256 over SHA-256, IEEE P1363 fixed-width signatures
    #[strum(serialize = "ecdsa-p256-sha256")]
    EcdsaP256Sha256,

    /// ECDSA on P-384 over SHA-384, IEEE P1363 fixed-width signatures
    #[strum(serialize = "ecdsa-p384-sha384")]
    EcdsaP384Sha384,

    #[strum(serialize = "ed25519")]
    Ed25519,

    #[strum(serialize = "hmac-sha256")]
    HmacSha256,
}

#[cfg(test)]
mod test {
    use super::SignatureAlgorithm;
    use std::str::FromStr;

    #[test]
    fn algorithm_tokens_round_trip() {
        let algorithms = [
            (SignatureAlgorithm::RsaV1_5Sha256, "rsa-v1_5-sha256"),
            (SignatureAlgorithm::RsaPssSha512, "rsa-pss-sha512"),
            (SignatureAlgorithm::EcdsaP256Sha256, "ecdsa-p256-sha256"),
            (SignatureAlgorithm::EcdsaP384Sha384, "ecdsa-p384-sha384"),
            (SignatureAlgorithm::Ed25519, "ed25519"),
            (SignatureAlgorithm::HmacSha256, "hmac-sha256"),
        ];

        for (algorithm, token) in algorithms {
            assert_eq!(algorithm.as_ref(), token);
            assert_eq!(SignatureAlgorithm::from_str(token).unwrap(), algorithm);
        }

        assert!(SignatureAlgorithm::from_str("rsa-sha1").is_err());
    }
}
