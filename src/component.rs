use crate::{
    context::SignatureContext,
    structured::{BareItem, Dictionary, Item, Key, List, ListEntry, Parameters, SfString},
    Error,
};
use http::{HeaderMap, Uri};
use miette::Diagnostic;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::str::FromStr;
use strum::{AsRefStr, EnumString};
use thiserror::Error as ThisError;

/// RFC 3986 unreserved characters stay literal, everything else is
/// percent-encoded when canonicalizing `@query-param` names and values
const QUERY_PARAM_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const FLAG_SF: &str = "sf";
const FLAG_KEY: &str = "key";
const FLAG_BS: &str = "bs";
const FLAG_REQ: &str = "req";
const FLAG_TR: &str = "tr";
const FLAG_NAME: &str = "name";

/// Serialization order of flags built through the typed API
const FLAG_ORDER: [&str; 6] = [FLAG_SF, FLAG_KEY, FLAG_BS, FLAG_REQ, FLAG_TR, FLAG_NAME];

#[derive(Clone, Copy, Debug, Diagnostic, ThisError, PartialEq, Eq)]
pub enum ComponentError {
    #[error("component identifier must be a string item")]
    NotAString,

    #[error("invalid component name")]
    InvalidName,

    #[error("unknown derived component")]
    UnknownDerived,

    #[error("unknown component flag")]
    UnknownFlag,

    #[error("flag carries an invalid value")]
    InvalidFlagValue,

    #[error("`bs` flag cannot be combined with `sf` or `key`")]
    BsConflict,

    #[error("`sf`, `bs`, `key`, and `tr` flags require a header component")]
    FieldFlagOnDerived,

    #[error("`req` flag cannot be used on @status")]
    ReqOnStatus,

    #[error("`name` flag is only valid on @query-param")]
    NameOnNonQueryParam,

    #[error("@query-param requires a `name` flag")]
    MissingName,
}

/// Components whose value is derived from message metadata rather than a field
#[derive(AsRefStr, EnumString, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DerivedComponent {
    #[strum(serialize = "@method")]
    Method,

    #[strum(serialize = "@target-uri")]
    TargetUri,

    #[strum(serialize = "@authority")]
    Authority,

    #[strum(serialize = "@scheme")]
    Scheme,

    #[strum(serialize = "@request-target")]
    RequestTarget,

    #[strum(serialize = "@path")]
    Path,

    #[strum(serialize = "@query")]
    Query,

    #[strum(serialize = "@query-param")]
    QueryParam,

    #[strum(serialize = "@status")]
    Status,
}

#[derive(Clone, Debug, PartialEq)]
enum ComponentName {
    Derived(DerivedComponent),
    Header(String),
}

/// A component identifier: name plus flag parameters
///
/// Flags built through the typed constructors always serialise in the fixed
/// order `sf`, `key`, `bs`, `req`, `tr`, `name`; identifiers parsed off the
/// wire keep the order they arrived in.
#[derive(Clone, Debug, PartialEq)]
pub struct SignatureComponent {
    name: ComponentName,
    params: Parameters,
}

impl SignatureComponent {
    #[must_use]
    pub fn derived(derived: DerivedComponent) -> Self {
        Self {
            name: ComponentName::Derived(derived),
            params: Parameters::new(),
        }
    }

    /// A header (or, with the `tr` flag, trailer) component
    pub fn header(name: &str) -> Result<Self, Error> {
        let name = name.to_ascii_lowercase();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte));
        if !valid {
            return Err(ComponentError::InvalidName.into());
        }

        Ok(Self {
            name: ComponentName::Header(name),
            params: Parameters::new(),
        })
    }

    /// `@query-param;name="..."`
    pub fn query_param(name: &str) -> Result<Self, Error> {
        let mut component = Self::derived(DerivedComponent::QueryParam);
        component.insert_flag(FLAG_NAME, BareItem::String(SfString::new(name)?));

        Ok(component)
    }

    /// Canonicalize the field as a structured field value
    pub fn with_sf(mut self) -> Result<Self, Error> {
        self.require_header()?;
        if self.has_flag(FLAG_BS) {
            return Err(ComponentError::BsConflict.into());
        }

        self.insert_flag(FLAG_SF, BareItem::Boolean(true));
        Ok(self)
    }

    /// Select a single member of a structured dictionary field
    pub fn with_key(mut self, key: &str) -> Result<Self, Error> {
        self.require_header()?;
        if self.has_flag(FLAG_BS) {
            return Err(ComponentError::BsConflict.into());
        }

        self.insert_flag(FLAG_KEY, BareItem::String(SfString::new(key)?));
        Ok(self)
    }

    /// Encode each field line as a byte sequence
    pub fn with_bs(mut self) -> Result<Self, Error> {
        self.require_header()?;
        if self.has_flag(FLAG_SF) || self.params.contains_key(FLAG_KEY) {
            return Err(ComponentError::BsConflict.into());
        }

        self.insert_flag(FLAG_BS, BareItem::Boolean(true));
        Ok(self)
    }

    /// Resolve against the related request instead of the primary context
    pub fn with_req(mut self) -> Result<Self, Error> {
        if self.name == ComponentName::Derived(DerivedComponent::Status) {
            return Err(ComponentError::ReqOnStatus.into());
        }

        self.insert_flag(FLAG_REQ, BareItem::Boolean(true));
        Ok(self)
    }

    /// Resolve against the trailer section instead of the headers
    pub fn with_tr(mut self) -> Result<Self, Error> {
        self.require_header()?;
        self.insert_flag(FLAG_TR, BareItem::Boolean(true));
        Ok(self)
    }

    /// Reconstruct an identifier from its wire form (a string item with
    /// parameters), keeping the parameter order as parsed
    pub(crate) fn from_item(item: &Item) -> Result<Self, Error> {
        let name = item
            .bare
            .as_string()
            .ok_or(ComponentError::NotAString)?;

        let name = if name.starts_with('@') {
            ComponentName::Derived(
                DerivedComponent::from_str(name).map_err(|_| ComponentError::UnknownDerived)?,
            )
        } else {
            let valid = !name.is_empty()
                && name.bytes().all(|byte| {
                    byte.is_ascii_lowercase()
                        || byte.is_ascii_digit()
                        || b"!#$%&'*+-.^_`|~".contains(&byte)
                });
            if !valid {
                return Err(ComponentError::InvalidName.into());
            }

            ComponentName::Header(name.to_owned())
        };

        let component = Self {
            name,
            params: item.params.clone(),
        };
        component.validate_flags()?;

        Ok(component)
    }

    /// The identifier as it appears in component lines and `@signature-params`
    pub(crate) fn identifier_item(&self) -> Result<Item, Error> {
        let name = match &self.name {
            ComponentName::Derived(derived) => derived.as_ref(),
            ComponentName::Header(name) => name,
        };

        Ok(Item::with_params(SfString::new(name)?, self.params.clone()))
    }

    pub(crate) fn serialised_identifier(&self) -> Result<String, Error> {
        Ok(self.identifier_item()?.serialise())
    }

    /// Canonical value(s) for this component, or `None` when the underlying
    /// value is not present in the context
    pub(crate) fn resolve(&self, context: &SignatureContext) -> Result<Option<Vec<String>>, Error> {
        let target = if self.has_flag(FLAG_REQ) {
            match &context.related_request {
                Some(related) => related,
                None => return Ok(None),
            }
        } else {
            context
        };

        match &self.name {
            ComponentName::Derived(derived) => self.resolve_derived(*derived, target),
            ComponentName::Header(name) => self.resolve_field(name, target),
        }
    }

    fn resolve_derived(
        &self,
        derived: DerivedComponent,
        context: &SignatureContext,
    ) -> Result<Option<Vec<String>>, Error> {
        let value = match derived {
            DerivedComponent::Method => Some(context.method.as_str().to_ascii_uppercase()),
            DerivedComponent::TargetUri => Some(context.uri.to_string()),
            DerivedComponent::Authority => authority(&context.uri),
            DerivedComponent::Scheme => context
                .uri
                .scheme_str()
                .map(str::to_ascii_lowercase),
            DerivedComponent::RequestTarget => Some(
                context
                    .uri
                    .path_and_query()
                    .map_or_else(|| context.uri.path(), http::uri::PathAndQuery::as_str)
                    .to_owned(),
            ),
            DerivedComponent::Path => {
                let path = context.uri.path();
                Some(if path.is_empty() { "/" } else { path }.to_owned())
            }
            DerivedComponent::Query => Some(format!("?{}", context.uri.query().unwrap_or(""))),
            DerivedComponent::QueryParam => return self.resolve_query_param(context),
            DerivedComponent::Status => context.status.map(|status| status.as_str().to_owned()),
        };

        Ok(value.map(|value| vec![value]))
    }

    fn resolve_query_param(&self, context: &SignatureContext) -> Result<Option<Vec<String>>, Error> {
        let wanted = self
            .params
            .get(FLAG_NAME)
            .and_then(BareItem::as_string)
            .ok_or(ComponentError::MissingName)?;
        let wanted = decode_query_part(wanted)?;

        let Some(query) = context.uri.query() else {
            return Ok(None);
        };

        let mut values = Vec::new();
        for pair in query.split('&') {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            if decode_query_part(name)? == wanted {
                let decoded = decode_query_part(value)?;
                values.push(utf8_percent_encode(&decoded, QUERY_PARAM_ENCODE_SET).to_string());
            }
        }

        Ok((!values.is_empty()).then_some(values))
    }

    fn resolve_field(
        &self,
        name: &str,
        context: &SignatureContext,
    ) -> Result<Option<Vec<String>>, Error> {
        let map: &HeaderMap = if self.has_flag(FLAG_TR) {
            &context.trailers
        } else {
            &context.headers
        };

        let mut lines = Vec::new();
        for value in map.get_all(name) {
            let line = value
                .to_str()
                .map_err(|_| Error::malformed("field value contains non-visible bytes"))?;
            lines.push(line.trim_matches([' ', '\t']).to_owned());
        }

        if lines.is_empty() {
            return Ok(None);
        }

        if self.has_flag(FLAG_BS) {
            let encoded = lines
                .iter()
                .map(|line| Item::new(line.clone().into_bytes()).serialise())
                .collect::<Vec<_>>()
                .join(", ");

            return Ok(Some(vec![encoded]));
        }

        let joined = lines.join(", ");

        if let Some(key) = self.params.get(FLAG_KEY) {
            let key = key
                .as_string()
                .or_else(|| key.as_token())
                .ok_or(ComponentError::InvalidFlagValue)?;
            let dictionary = Dictionary::parse(&joined)?;

            return Ok(dictionary.get(key).map(|entry| {
                let serialised = match entry {
                    ListEntry::Item(item) => item.serialise(),
                    ListEntry::InnerList(list) => list.serialise(),
                };
                vec![serialised]
            }));
        }

        if self.has_flag(FLAG_SF) {
            return Ok(Some(vec![canonicalise_structured(&joined)?]));
        }

        Ok(Some(vec![joined]))
    }

    fn require_header(&self) -> Result<(), Error> {
        match self.name {
            ComponentName::Header(..) => Ok(()),
            ComponentName::Derived(..) => Err(ComponentError::FieldFlagOnDerived.into()),
        }
    }

    fn has_flag(&self, flag: &str) -> bool {
        self.params.get(flag).and_then(BareItem::as_boolean) == Some(true)
    }

    /// Insert a flag, then restore the canonical flag order
    fn insert_flag(&mut self, flag: &str, value: BareItem) {
        let mut flags: Vec<(Key, BareItem)> = self
            .params
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        flags.push((Key::new(flag).expect("flag names are valid keys"), value));

        let mut params = Parameters::new();
        for flag in FLAG_ORDER {
            if let Some((key, value)) = flags.iter().find(|(key, _)| key.as_str() == flag) {
                params.insert(key.clone(), value.clone());
            }
        }

        self.params = params;
    }

    fn validate_flags(&self) -> Result<(), Error> {
        for (key, value) in self.params.iter() {
            match key.as_str() {
                FLAG_SF | FLAG_BS | FLAG_REQ | FLAG_TR => {
                    if value.as_boolean() != Some(true) {
                        return Err(ComponentError::InvalidFlagValue.into());
                    }
                }
                FLAG_KEY => {
                    if value.as_string().or_else(|| value.as_token()).is_none() {
                        return Err(ComponentError::InvalidFlagValue.into());
                    }
                }
                FLAG_NAME => {
                    if value.as_string().is_none() {
                        return Err(ComponentError::InvalidFlagValue.into());
                    }
                }
                _ => return Err(ComponentError::UnknownFlag.into()),
            }
        }

        if self.has_flag(FLAG_BS) && (self.has_flag(FLAG_SF) || self.params.contains_key(FLAG_KEY))
        {
            return Err(ComponentError::BsConflict.into());
        }

        let is_header = matches!(self.name, ComponentName::Header(..));
        if !is_header
            && (self.has_flag(FLAG_SF)
                || self.has_flag(FLAG_BS)
                || self.has_flag(FLAG_TR)
                || self.params.contains_key(FLAG_KEY))
        {
            return Err(ComponentError::FieldFlagOnDerived.into());
        }

        if self.has_flag(FLAG_REQ) && self.name == ComponentName::Derived(DerivedComponent::Status)
        {
            return Err(ComponentError::ReqOnStatus.into());
        }

        match (
            self.name == ComponentName::Derived(DerivedComponent::QueryParam),
            self.params.contains_key(FLAG_NAME),
        ) {
            (true, false) => Err(ComponentError::MissingName.into()),
            (false, true) => Err(ComponentError::NameOnNonQueryParam.into()),
            _ => Ok(()),
        }
    }
}

fn authority(uri: &Uri) -> Option<String> {
    let authority = uri.authority()?;
    let host = authority.host().to_ascii_lowercase();

    let default_port = match uri.scheme_str() {
        Some("http") => Some(80),
        Some("https") => Some(443),
        _ => None,
    };

    match authority.port_u16() {
        Some(port) if Some(port) != default_port => Some(format!("{host}:{port}")),
        _ => Some(host),
    }
}

/// Re-serialize a field value in canonical structured form
///
/// Field values do not carry their own type, so the narrowest grammar that
/// accepts the value wins: a single item, then a list, then a dictionary.
fn canonicalise_structured(value: &str) -> Result<String, Error> {
    if let Ok(item) = Item::parse(value) {
        return Ok(item.serialise());
    }
    if let Ok(list) = List::parse(value) {
        return Ok(list.serialise());
    }

    Ok(Dictionary::parse(value)?.serialise())
}

fn decode_query_part(value: &str) -> Result<String, Error> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::malformed("query parameter is not valid UTF-8"))
}
