use crate::{
    component::SignatureComponent,
    context::SignatureContext,
    structured::{BareItem, InnerList, Integer, Key, Parameters, SfString, Token},
    Error,
};
use std::fmt::Write;

/// Well-known signature parameter names
pub mod param {
    pub const CREATED: &str = "created";
    pub const EXPIRES: &str = "expires";
    pub const NONCE: &str = "nonce";
    pub const ALG: &str = "alg";
    pub const KEYID: &str = "keyid";
    pub const TAG: &str = "tag";
}

/// Parameters attached to the `@signature-params` line
///
/// Order is load-bearing: parameters serialise in insertion order, and the
/// serialised form is covered by the signature. Parameters parsed off the
/// wire are preserved verbatim, including ones this crate knows nothing
/// about.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignatureParameters {
    inner: Parameters,
}

impl SignatureParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(mut self, seconds: i64) -> Result<Self, Error> {
        self.insert(param::CREATED, BareItem::Integer(Integer::new(seconds)?));
        Ok(self)
    }

    pub fn expires(mut self, seconds: i64) -> Result<Self, Error> {
        self.insert(param::EXPIRES, BareItem::Integer(Integer::new(seconds)?));
        Ok(self)
    }

    pub fn nonce(mut self, nonce: &str) -> Result<Self, Error> {
        self.insert(param::NONCE, BareItem::String(SfString::new(nonce)?));
        Ok(self)
    }

    pub fn alg(mut self, alg: &str) -> Result<Self, Error> {
        self.insert(param::ALG, BareItem::Token(Token::new(alg)?));
        Ok(self)
    }

    pub fn keyid(mut self, keyid: &str) -> Result<Self, Error> {
        self.insert(param::KEYID, BareItem::String(SfString::new(keyid)?));
        Ok(self)
    }

    pub fn tag(mut self, tag: &str) -> Result<Self, Error> {
        self.insert(param::TAG, BareItem::String(SfString::new(tag)?));
        Ok(self)
    }

    fn insert(&mut self, name: &'static str, value: BareItem) {
        self.inner
            .insert(Key::new(name).expect("parameter names are valid keys"), value);
    }

    /// Validate and adopt parameters parsed from a `Signature-Input` entry
    pub(crate) fn from_wire(params: &Parameters) -> Result<Self, Error> {
        for (key, value) in params.iter() {
            let valid = match key.as_str() {
                param::CREATED | param::EXPIRES => value.as_integer().is_some(),
                param::NONCE | param::KEYID | param::TAG => value.as_string().is_some(),
                param::ALG => value.as_token().is_some(),
                // Unknown parameters ride along untouched
                _ => true,
            };

            if !valid {
                return Err(Error::malformed("signature parameter has the wrong type"));
            }
        }

        Ok(Self {
            inner: params.clone(),
        })
    }

    #[must_use]
    pub fn get_created(&self) -> Option<i64> {
        self.inner.get(param::CREATED).and_then(BareItem::as_integer)
    }

    #[must_use]
    pub fn get_expires(&self) -> Option<i64> {
        self.inner.get(param::EXPIRES).and_then(BareItem::as_integer)
    }

    #[must_use]
    pub fn get_nonce(&self) -> Option<&str> {
        self.inner.get(param::NONCE).and_then(BareItem::as_string)
    }

    #[must_use]
    pub fn get_alg(&self) -> Option<&str> {
        self.inner.get(param::ALG).and_then(BareItem::as_token)
    }

    #[must_use]
    pub fn get_keyid(&self) -> Option<&str> {
        self.inner.get(param::KEYID).and_then(BareItem::as_string)
    }

    #[must_use]
    pub fn get_tag(&self) -> Option<&str> {
        self.inner.get(param::TAG).and_then(BareItem::as_string)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub(crate) fn as_parameters(&self) -> &Parameters {
        &self.inner
    }
}

/// A component selected for signing
#[derive(Clone, Debug, PartialEq)]
pub struct CoveredComponent {
    pub(crate) component: SignatureComponent,
    pub(crate) used_if_present: bool,
}

impl From<SignatureComponent> for CoveredComponent {
    fn from(component: SignatureComponent) -> Self {
        Self {
            component,
            used_if_present: false,
        }
    }
}

impl SignatureComponent {
    /// Cover this component only when its value is present; it silently
    /// drops out of the base otherwise
    #[must_use]
    pub fn if_present(self) -> CoveredComponent {
        CoveredComponent {
            component: self,
            used_if_present: true,
        }
    }
}

/// The canonical byte string that is signed or verified
#[derive(Clone, Debug)]
pub struct SignatureBase {
    base: String,
    parameters_value: String,
}

impl SignatureBase {
    pub fn build(
        components: &[CoveredComponent],
        parameters: &SignatureParameters,
        context: &SignatureContext,
    ) -> Result<Self, Error> {
        for (index, covered) in components.iter().enumerate() {
            let duplicate = components[..index]
                .iter()
                .any(|other| other.component == covered.component);
            if duplicate {
                return Err(Error::DuplicateComponent(
                    covered.component.serialised_identifier()?,
                ));
            }
        }

        let mut base = String::new();
        let mut identifiers = Vec::new();

        for covered in components {
            let identifier = covered.component.serialised_identifier()?;

            match covered.component.resolve(context)? {
                Some(values) => {
                    for value in values {
                        let _ = writeln!(base, "{identifier}: {value}");
                    }
                    identifiers.push(covered.component.identifier_item()?);
                }
                None if covered.used_if_present => {}
                None => return Err(Error::MissingComponent(identifier)),
            }
        }

        let inner_list = InnerList {
            items: identifiers,
            params: parameters.as_parameters().clone(),
        };
        let parameters_value = inner_list.serialise();
        let _ = write!(base, "\"@signature-params\": {parameters_value}");

        Ok(Self {
            base,
            parameters_value,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// The exact value of the `Signature-Input` dictionary entry
    #[must_use]
    pub fn parameters_value(&self) -> &str {
        &self.parameters_value
    }
}

#[cfg(test)]
mod test {
    use super::{CoveredComponent, SignatureBase, SignatureParameters};
    use crate::{
        component::{DerivedComponent, SignatureComponent},
        context::SignatureContext,
        structured::List,
        Error,
    };
    use http::{HeaderMap, HeaderValue, Method, Uri};

    fn context() -> SignatureContext {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        SignatureContext::builder()
            .method(Method::POST)
            .uri(Uri::from_static("https://example.com/foo?param=value"))
            .headers(headers)
            .build()
    }

    fn covered(component: SignatureComponent) -> CoveredComponent {
        component.into()
    }

    #[test]
    fn base_is_deterministic_and_ordered() {
        let components = vec![
            covered(SignatureComponent::derived(DerivedComponent::Method)),
            covered(SignatureComponent::derived(DerivedComponent::Path)),
            covered(SignatureComponent::header("content-type").unwrap()),
        ];
        let parameters = SignatureParameters::new()
            .created(1_618_884_473)
            .unwrap()
            .keyid("test-key")
            .unwrap();

        let expected = "\"@method\": POST\n\
                        \"@path\": /foo\n\
                        \"content-type\": application/json\n\
                        \"@signature-params\": (\"@method\" \"@path\" \"content-type\");created=1618884473;keyid=\"test-key\"";

        let first = SignatureBase::build(&components, &parameters, &context()).unwrap();
        let second = SignatureBase::build(&components, &parameters, &context()).unwrap();

        assert_eq!(first.as_str(), expected);
        assert_eq!(first.as_str(), second.as_str());
        assert_eq!(
            first.parameters_value(),
            "(\"@method\" \"@path\" \"content-type\");created=1618884473;keyid=\"test-key\"",
        );
    }

    #[test]
    fn missing_component_fails_unless_marked_if_present() {
        let parameters = SignatureParameters::new();

        let required = vec![covered(SignatureComponent::header("authorization").unwrap())];
        assert!(matches!(
            SignatureBase::build(&required, &parameters, &context()),
            Err(Error::MissingComponent(..)),
        ));

        let optional = vec![
            covered(SignatureComponent::derived(DerivedComponent::Method)),
            SignatureComponent::header("authorization").unwrap().if_present(),
        ];
        let base = SignatureBase::build(&optional, &parameters, &context()).unwrap();
        assert_eq!(
            base.as_str(),
            "\"@method\": POST\n\"@signature-params\": (\"@method\")",
        );
    }

    fn wire_parameters(value: &str) -> Result<SignatureParameters, Error> {
        let list = List::parse(value).unwrap();
        let inner = list.0[0].as_inner_list().unwrap();

        SignatureParameters::from_wire(&inner.params)
    }

    #[test]
    fn wire_parameters_expose_typed_getters() {
        let parameters = wire_parameters(
            r#"("@method");created=1618884473;expires=1618884773;nonce="n";alg=ed25519;keyid="k";tag="app-1";x-custom=1"#,
        )
        .unwrap();

        assert_eq!(parameters.get_created(), Some(1_618_884_473));
        assert_eq!(parameters.get_expires(), Some(1_618_884_773));
        assert_eq!(parameters.get_nonce(), Some("n"));
        assert_eq!(parameters.get_alg(), Some("ed25519"));
        assert_eq!(parameters.get_keyid(), Some("k"));
        assert_eq!(parameters.get_tag(), Some("app-1"));

        // Unknown parameters ride along for the base rebuild
        assert!(parameters.contains("x-custom"));
    }

    #[test]
    fn wire_parameters_reject_wrong_types() {
        assert!(wire_parameters(r#"("@method");tag=1"#).is_err());
        assert!(wire_parameters(r#"("@method");created="soon""#).is_err());
        assert!(wire_parameters(r#"("@method");alg="ed25519""#).is_err());
    }

    #[test]
    fn duplicate_components_rejected() {
        let components = vec![
            covered(SignatureComponent::derived(DerivedComponent::Method)),
            covered(SignatureComponent::derived(DerivedComponent::Method)),
        ];

        assert!(matches!(
            SignatureBase::build(&components, &SignatureParameters::new(), &context()),
            Err(Error::DuplicateComponent(..)),
        ));
    }

    #[test]
    fn same_name_different_flags_is_not_a_duplicate() {
        let components = vec![
            covered(SignatureComponent::header("content-type").unwrap()),
            covered(
                SignatureComponent::header("content-type")
                    .unwrap()
                    .with_bs()
                    .unwrap(),
            ),
        ];

        assert!(
            SignatureBase::build(&components, &SignatureParameters::new(), &context()).is_ok()
        );
    }
}
