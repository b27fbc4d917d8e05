use crate::{
    base::{CoveredComponent, SignatureBase, SignatureParameters},
    component::SignatureComponent,
    context::SignatureContext,
    crypto::{SignatureAlgorithm, VerificationKey},
    structured::{Dictionary, ListEntry},
    util::UnixTimestampExt,
    BoxError, Error,
};
use std::{
    str::FromStr,
    time::{Duration, SystemTime},
};
use typed_builder::TypedBuilder;

/// Policy and inputs for verifying one signature
#[derive(TypedBuilder)]
pub struct VerificationSpec<'a> {
    context: &'a SignatureContext,

    /// Raw `Signature-Input` header value
    signature_input: &'a str,

    /// Raw `Signature` header value
    signature: &'a str,

    /// Label to verify; without one, the headers must contain exactly one
    /// signature
    #[builder(default, setter(strip_option))]
    label: Option<&'a str>,

    /// Components that must be covered by the signature
    #[builder(default)]
    required_components: Vec<SignatureComponent>,

    /// Components that must be covered whenever their value is present
    #[builder(default)]
    required_if_present_components: Vec<SignatureComponent>,

    #[builder(default)]
    required_parameters: Vec<&'a str>,

    #[builder(default)]
    forbidden_parameters: Vec<&'a str>,

    /// Upper bound on `now - created`
    #[builder(default, setter(strip_option))]
    maximum_age: Option<Duration>,

    /// Tolerated clock difference between signer and verifier
    #[builder(default)]
    maximum_skew: Duration,

    /// Verification time; defaults to the wall clock
    #[builder(default, setter(strip_option))]
    now: Option<SystemTime>,
}

/// Verify a signature against the spec's policy
///
/// `get_key` resolves the signature's `keyid` parameter (when present) to
/// the verification key; its failures surface as the cause of
/// [`Error::KeyError`].
pub fn verify<F>(spec: &VerificationSpec<'_>, get_key: F) -> Result<(), Error>
where
    F: FnOnce(Option<&str>) -> Result<VerificationKey, BoxError>,
{
    let input_dictionary = Dictionary::parse(spec.signature_input)?;

    let (label, entry) = match spec.label {
        Some(label) => {
            let entry = input_dictionary
                .get(label)
                .ok_or_else(|| Error::malformed("no signature-input entry for the label"))?;
            (label, entry)
        }
        None => {
            if input_dictionary.len() != 1 {
                return Err(Error::AmbiguousLabel);
            }
            let (label, entry) = input_dictionary
                .iter()
                .next()
                .ok_or(Error::AmbiguousLabel)?;
            (label.as_str(), entry)
        }
    };

    let inner_list = entry
        .as_inner_list()
        .ok_or_else(|| Error::malformed("signature-input entry must be an inner list"))?;

    let components = inner_list
        .items
        .iter()
        .map(SignatureComponent::from_item)
        .collect::<Result<Vec<_>, _>>()?;
    let parameters = SignatureParameters::from_wire(&inner_list.params)?;

    for required in &spec.required_components {
        if !components.contains(required) {
            return Err(Error::MissingComponent(required.serialised_identifier()?));
        }
    }

    for required in &spec.required_if_present_components {
        if !components.contains(required) && required.resolve(spec.context)?.is_some() {
            return Err(Error::MissingComponent(required.serialised_identifier()?));
        }
    }

    for name in &spec.required_parameters {
        if !parameters.contains(name) {
            return Err(Error::MissingParameter((*name).to_owned()));
        }
    }
    for name in &spec.forbidden_parameters {
        if parameters.contains(name) {
            return Err(Error::ForbiddenParameter((*name).to_owned()));
        }
    }

    enforce_clock(spec, &parameters)?;

    // Rebuild the base from the identifiers exactly as they were parsed
    let covered = components
        .into_iter()
        .map(CoveredComponent::from)
        .collect::<Vec<_>>();
    let base = SignatureBase::build(&covered, &parameters, spec.context)?;

    let key = get_key(parameters.get_keyid()).map_err(Error::KeyError)?;

    if let Some(alg) = parameters.get_alg() {
        let alg = SignatureAlgorithm::from_str(alg).map_err(|_| Error::UnsupportedAlgorithm)?;
        if alg != key.algorithm() {
            return Err(Error::UnsupportedAlgorithm);
        }
    }

    let signature_dictionary = Dictionary::parse(spec.signature)?;
    let signature = signature_dictionary
        .get(label)
        .and_then(ListEntry::as_item)
        .and_then(|item| item.bare.as_bytes())
        .ok_or_else(|| Error::malformed("signature entry must be a byte sequence"))?;

    key.verify(base.as_str().as_bytes(), signature)?;
    debug!(label, "verified signature");

    Ok(())
}

#[allow(clippy::cast_possible_wrap)]
fn enforce_clock(
    spec: &VerificationSpec<'_>,
    parameters: &SignatureParameters,
) -> Result<(), Error> {
    let now = spec
        .now
        .unwrap_or_else(SystemTime::now)
        .to_unix_timestamp();
    let skew = spec.maximum_skew.as_secs() as i64;

    if let Some(created) = parameters.get_created() {
        if now < created.saturating_sub(skew) {
            return Err(Error::FutureSignature);
        }

        if let Some(maximum_age) = spec.maximum_age {
            if now > created.saturating_add(maximum_age.as_secs() as i64) {
                return Err(Error::TooOld);
            }
        }
    }

    if let Some(expires) = parameters.get_expires() {
        if now > expires.saturating_add(skew) {
            return Err(Error::Expired);
        }
    }

    Ok(())
}
