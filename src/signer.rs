use crate::{
    base::{CoveredComponent, SignatureBase, SignatureParameters},
    context::SignatureContext,
    crypto::SigningKey,
    structured::{Dictionary, Item, Key},
    Error, SIGNATURE_HEADER, SIGNATURE_INPUT_HEADER,
};
use http::{HeaderMap, HeaderValue};
use typed_builder::TypedBuilder;

/// Everything needed to produce one signature
///
/// Built once, consumed once by [`sign`].
#[derive(TypedBuilder)]
pub struct SignatureSpec<'a> {
    label: &'a str,

    components: Vec<CoveredComponent>,

    #[builder(default)]
    parameters: SignatureParameters,

    context: &'a SignatureContext,

    key: SigningKey,
}

/// Output of a successful signing operation
#[derive(Clone, Debug)]
pub struct SignedHeaders {
    /// Value of the `Signature-Input` header
    pub signature_input: String,

    /// Value of the `Signature` header
    pub signature: String,

    /// The signature base the signature was computed over, for debugging
    pub base: String,
}

impl SignedHeaders {
    /// Insert both signature headers into a header map
    pub fn apply(&self, headers: &mut HeaderMap) -> Result<(), Error> {
        let signature_input = HeaderValue::from_str(&self.signature_input)
            .map_err(|_| Error::malformed("header value contains invalid bytes"))?;
        let signature = HeaderValue::from_str(&self.signature)
            .map_err(|_| Error::malformed("header value contains invalid bytes"))?;

        headers.insert(SIGNATURE_INPUT_HEADER.clone(), signature_input);
        headers.insert(SIGNATURE_HEADER.clone(), signature);

        Ok(())
    }
}

/// Sign the message described by the spec
///
/// Components marked [`SignatureComponent::if_present`] whose value is
/// absent drop out of both the base and the `@signature-params` line.
///
/// [`SignatureComponent::if_present`]: crate::SignatureComponent::if_present
pub fn sign(spec: SignatureSpec<'_>) -> Result<SignedHeaders, Error> {
    let label = Key::new(spec.label)?;
    if spec.components.is_empty() {
        return Err(Error::MissingComponent(
            "signature covers no components".to_owned(),
        ));
    }

    let base = SignatureBase::build(&spec.components, &spec.parameters, spec.context)?;
    debug!(label = label.as_str(), "constructed signature base");

    let signature = spec.key.sign(base.as_str().as_bytes())?;

    // The serialised parameters line reappears verbatim as the entry value
    let signature_input = format!("{}={}", label.as_str(), base.parameters_value());

    let mut signature_dictionary = Dictionary::new();
    signature_dictionary.insert(label, Item::new(signature));

    Ok(SignedHeaders {
        signature_input,
        signature: signature_dictionary.serialise(),
        base: base.as_str().to_owned(),
    })
}
