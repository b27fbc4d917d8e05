use http_message_signatures::{
    digest::{self, DigestAlgorithm},
    Error,
};

const BODY: &[u8] = br#"{"id":5}"#;

#[test]
fn calculated_header_verifies() {
    let header = digest::calculate(BODY, DigestAlgorithm::Sha256);
    assert_eq!(header, "sha-256=:6OmHaBI2g/rwfqRYa7gDrkPe9/ib94h74Ir2FL2RCCc=:");

    digest::verify(&header, BODY).unwrap();
}

#[test]
fn wrong_digest_is_a_mismatch() {
    let header = "sha-256=:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=:";
    assert!(matches!(digest::verify(header, BODY), Err(Error::Mismatch)));
}

#[test]
fn digest_of_different_body_is_a_mismatch() {
    let header = digest::calculate(br#"{"id":6}"#, DigestAlgorithm::Sha256);
    assert!(matches!(digest::verify(&header, BODY), Err(Error::Mismatch)));
}

#[test]
fn negotiated_digest_round_trips() {
    let header = digest::calculate_preferred(BODY, "sha-256=0.4, sha-512=0.9").unwrap();
    assert!(header.starts_with("sha-512=:"));

    digest::verify(&header, BODY).unwrap();
}

#[test]
fn want_header_with_no_supported_entry_fails() {
    assert!(matches!(
        digest::calculate_preferred(BODY, "md5=1"),
        Err(Error::UnsupportedAlgorithm),
    ));
}

#[test]
fn malformed_want_header_fails() {
    assert!(matches!(
        digest::calculate_preferred(BODY, "sha-256=(broken"),
        Err(Error::InvalidStructuredHeader(..)),
    ));
}
