use http::{HeaderMap, HeaderValue};
use http_message_signatures::{
    sign, verify, DerivedComponent, Error, SignatureComponent, SignatureParameters, SignatureSpec,
    VerificationSpec,
};
use std::time::{Duration, SystemTime};

mod data;

fn unix(seconds: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(seconds)
}

fn signed_with_parameters(parameters: SignatureParameters) -> (String, String) {
    let context = data::request_context();
    let signed = sign(
        SignatureSpec::builder()
            .label("sig")
            .components(vec![
                SignatureComponent::derived(DerivedComponent::Method).into(),
                SignatureComponent::header("content-type").unwrap().into(),
            ])
            .parameters(parameters)
            .context(&context)
            .key(data::ed25519_signing_key())
            .build(),
    )
    .unwrap();

    (signed.signature_input, signed.signature)
}

#[test]
fn too_old_signature_rejected() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().created(1000).unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .maximum_age(Duration::from_secs(10))
        .now(unix(2000))
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::TooOld),
    ));
}

#[test]
fn expired_signature_rejected_within_skew_accepted() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().expires(1000).unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .now(unix(2000))
        .build();
    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::Expired),
    ));

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .maximum_skew(Duration::from_secs(1500))
        .now(unix(2000))
        .build();
    verify(&spec, |_| Ok(data::ed25519_verification_key())).unwrap();
}

#[test]
fn future_signature_rejected_within_skew_accepted() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().created(5000).unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .now(unix(1000))
        .build();
    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::FutureSignature),
    ));

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .maximum_skew(Duration::from_secs(10_000))
        .now(unix(1000))
        .build();
    verify(&spec, |_| Ok(data::ed25519_verification_key())).unwrap();
}

#[test]
fn ambiguous_label_without_selection() {
    let context = data::request_context();
    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(r#"a=("@method"), b=("@path")"#)
        .signature("a=:AAAA:")
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::AmbiguousLabel),
    ));
}

#[test]
fn single_entry_needs_no_label() {
    let context = data::request_context();
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .build();

    verify(&spec, |_| Ok(data::ed25519_verification_key())).unwrap();
}

#[test]
fn required_component_must_be_covered() {
    let context = data::request_context();
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .required_components(vec![SignatureComponent::derived(DerivedComponent::Authority)])
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::MissingComponent(..)),
    ));
}

#[test]
fn present_header_in_required_if_present_must_be_covered() {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("application/json"));
    headers.insert("authorization", HeaderValue::from_static("Bearer token"));
    let context = data::context_with_headers(headers);

    let signed = sign(
        SignatureSpec::builder()
            .label("sig")
            .components(vec![
                SignatureComponent::derived(DerivedComponent::Method).into()
            ])
            .context(&context)
            .key(data::ed25519_signing_key())
            .build(),
    )
    .unwrap();

    let required_if_present = vec![SignatureComponent::header("authorization").unwrap()];
    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signed.signature_input)
        .signature(&signed.signature)
        .required_if_present_components(required_if_present.clone())
        .build();
    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::MissingComponent(..)),
    ));

    // Absent from the context: the same policy passes
    let context = data::request_context();
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());
    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .required_if_present_components(required_if_present)
        .build();
    verify(&spec, |_| Ok(data::ed25519_verification_key())).unwrap();
}

#[test]
fn parameter_policy_enforced() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().created(1000).unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .required_parameters(vec!["nonce"])
        .build();
    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::MissingParameter(..)),
    ));

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .forbidden_parameters(vec!["created"])
        .build();
    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::ForbiddenParameter(..)),
    ));
}

#[test]
fn tampered_message_fails_verification() {
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());

    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static("text/html"));
    let context = data::context_with_headers(headers);

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::InvalidSignature),
    ));
}

#[test]
fn getter_failure_wrapped_as_key_error() {
    let context = data::request_context();
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .build();

    let result = verify(&spec, |_| Err("key store unreachable".into()));
    assert!(matches!(result, Err(Error::KeyError(..))));
}

#[test]
fn alg_parameter_must_match_key_algorithm() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().alg("ed25519").unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .build();

    let hmac_key =
        http_message_signatures::VerificationKey::hmac_from_base64(data::HMAC_SHARED_SECRET)
            .unwrap();
    assert!(matches!(
        verify(&spec, move |_| Ok(hmac_key)),
        Err(Error::UnsupportedAlgorithm),
    ));
}

#[test]
fn unknown_alg_token_is_unsupported() {
    let context = data::request_context();
    let (signature_input, signature) =
        signed_with_parameters(SignatureParameters::new().alg("blake3-sig").unwrap());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::UnsupportedAlgorithm),
    ));
}

#[test]
fn signature_entry_must_be_byte_sequence() {
    let context = data::request_context();
    let (signature_input, _) = signed_with_parameters(SignatureParameters::new());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(r#"sig="not a byte sequence""#)
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::InvalidStructuredHeader(..)),
    ));
}

#[test]
fn duplicate_covered_components_rejected() {
    let context = data::request_context();
    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(r#"sig=("@method" "@method")"#)
        .signature("sig=:AAAA:")
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::DuplicateComponent(..)),
    ));
}

#[test]
fn unknown_component_flag_rejected() {
    let context = data::request_context();
    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(r#"sig=("@method";wild)"#)
        .signature("sig=:AAAA:")
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::InvalidStructuredHeader(..)),
    ));
}

#[test]
fn missing_label_is_rejected() {
    let context = data::request_context();
    let (signature_input, signature) = signed_with_parameters(SignatureParameters::new());

    let spec = VerificationSpec::builder()
        .context(&context)
        .signature_input(&signature_input)
        .signature(&signature)
        .label("other")
        .build();

    assert!(matches!(
        verify(&spec, |_| Ok(data::ed25519_verification_key())),
        Err(Error::InvalidStructuredHeader(..)),
    ));
}
