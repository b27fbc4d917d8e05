//! Content digest calculation and verification (`Content-Digest` /
//! `Want-Content-Digest`), layered over the structured dictionary grammar

use crate::{
    structured::{Dictionary, Item, Key},
    Error,
};
use sha2::{Digest as _, Sha256, Sha512};
use std::str::FromStr;
use strum::{AsRefStr, EnumString};

#[derive(AsRefStr, Clone, Copy, Debug, Default, EnumString, PartialEq, Eq)]
pub enum DigestAlgorithm {
    #[default]
    #[strum(serialize = "sha-256")]
    Sha256,

    #[strum(serialize = "sha-512")]
    Sha512,
}

impl DigestAlgorithm {
    #[must_use]
    pub fn digest(self, data: impl AsRef<[u8]>) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    fn key(self) -> Key {
        Key::new(self.as_ref()).expect("algorithm tokens are valid keys")
    }
}

/// Compute a `Content-Digest` value over the given body
#[must_use]
pub fn calculate(body: impl AsRef<[u8]>, algorithm: DigestAlgorithm) -> String {
    let mut dictionary = Dictionary::new();
    dictionary.insert(algorithm.key(), Item::new(algorithm.digest(body)));

    dictionary.serialise()
}

/// Compute a `Content-Digest` value honouring a `Want-Content-Digest` header
///
/// Picks the supported algorithm with the highest weight, ties broken by
/// first occurrence. A weight of zero marks an algorithm as unacceptable.
pub fn calculate_preferred(body: impl AsRef<[u8]>, want_header: &str) -> Result<String, Error> {
    let want = Dictionary::parse(want_header)?;

    let mut best: Option<(DigestAlgorithm, i64)> = None;
    for (key, entry) in want.iter() {
        let weight = entry
            .as_item()
            .and_then(|item| item.bare.as_decimal())
            .ok_or_else(|| Error::malformed("digest weight must be a number"))?;
        if !(0..=1000).contains(&weight) {
            return Err(Error::malformed("digest weight must lie within [0, 1]"));
        }

        let Ok(algorithm) = DigestAlgorithm::from_str(key.as_str()) else {
            continue;
        };

        if weight > 0 && best.is_none_or(|(_, best_weight)| weight > best_weight) {
            best = Some((algorithm, weight));
        }
    }

    let (algorithm, _) = best.ok_or(Error::UnsupportedAlgorithm)?;
    Ok(calculate(body, algorithm))
}

/// Verify a `Content-Digest` value against the given body
///
/// Every supported entry must match; unsupported entries are ignored as long
/// as at least one supported entry is present.
pub fn verify(header: &str, body: impl AsRef<[u8]>) -> Result<(), Error> {
    let dictionary = Dictionary::parse(header)?;

    let mut supported = 0_usize;
    for (key, entry) in dictionary.iter() {
        let Ok(algorithm) = DigestAlgorithm::from_str(key.as_str()) else {
            continue;
        };
        supported += 1;

        let expected = entry
            .as_item()
            .and_then(|item| item.bare.as_bytes())
            .ok_or_else(|| Error::malformed("digest value must be a byte sequence"))?;

        if algorithm.digest(body.as_ref()) != expected {
            return Err(Error::Mismatch);
        }
    }

    if supported == 0 {
        return Err(Error::UnsupportedAlgorithm);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::{calculate, calculate_preferred, verify, DigestAlgorithm};
    use crate::Error;

    const BODY: &[u8] = br#"{"hello": "world"}"#;
    const BODY_SHA256: &str = "sha-256=:X48E9qOokqqrvdts8nOJRJN3OWDUoyWxBf7kbu9DBPE=:";
    const BODY_SHA512: &str = "sha-512=:WZDPaVn/7XgHaAy8pmojAkGWoRx2UFChF41A2svX+TaPm+AbwAgBWnrIiYllu7BNNyealdVLvRwEmTHWXvJwew==:";

    #[test]
    fn calculate_produces_single_entry_dictionary() {
        assert_eq!(calculate(BODY, DigestAlgorithm::Sha256), BODY_SHA256);
        assert_eq!(calculate(BODY, DigestAlgorithm::Sha512), BODY_SHA512);
    }

    #[test]
    fn verify_round_trips() {
        verify(BODY_SHA256, BODY).unwrap();
        verify(BODY_SHA512, BODY).unwrap();
    }

    #[test]
    fn verify_rejects_wrong_digest() {
        let header = "sha-256=:6OmHaBI2g/rwfqRYa7gDrkPe9/ib94h74Ir2FL2RCCc=:";
        assert!(matches!(verify(header, BODY), Err(Error::Mismatch)));
    }

    #[test]
    fn verify_ignores_unsupported_entries_next_to_supported_ones() {
        let header = format!("unknown-alg=:AAAA:, {BODY_SHA256}");
        verify(&header, BODY).unwrap();
    }

    #[test]
    fn verify_rejects_unsupported_only() {
        assert!(matches!(
            verify("unknown-alg=:AAAA:", BODY),
            Err(Error::UnsupportedAlgorithm),
        ));
    }

    #[test]
    fn preferred_picks_highest_weight() {
        let header = calculate_preferred(BODY, "sha-256=0.5, sha-512=0.9").unwrap();
        assert_eq!(header, BODY_SHA512);
    }

    #[test]
    fn preferred_breaks_ties_by_first_occurrence() {
        let header = calculate_preferred(BODY, "sha-512=1, sha-256=1").unwrap();
        assert_eq!(header, BODY_SHA512);
    }

    #[test]
    fn preferred_skips_zero_weight() {
        let header = calculate_preferred(BODY, "sha-512=0, sha-256=0.1").unwrap();
        assert_eq!(header, BODY_SHA256);

        assert!(matches!(
            calculate_preferred(BODY, "sha-512=0"),
            Err(Error::UnsupportedAlgorithm),
        ));
    }

    #[test]
    fn preferred_rejects_malformed_weights() {
        assert!(calculate_preferred(BODY, "sha-256=2").is_err());
        assert!(calculate_preferred(BODY, "sha-256=yes").is_err());
        assert!(calculate_preferred(BODY, "not a dictionary!!").is_err());
    }
}
