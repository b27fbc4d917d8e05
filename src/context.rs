use http::{request, response, HeaderMap, Method, StatusCode, Uri};
use typed_builder::TypedBuilder;

/// Everything a signature component can be resolved against
///
/// Header and trailer maps are case-insensitive, order-preserving multimaps;
/// multiple field lines of the same name stay separate until
/// canonicalization joins them.
#[derive(Clone, Debug, TypedBuilder)]
pub struct SignatureContext {
    pub method: Method,

    pub uri: Uri,

    /// Response status; requests leave this unset
    #[builder(default, setter(strip_option))]
    pub status: Option<StatusCode>,

    #[builder(default)]
    pub headers: HeaderMap,

    #[builder(default)]
    pub trailers: HeaderMap,

    /// The originating request when this context describes a response,
    /// referenced by components carrying the `req` flag
    #[builder(default, setter(strip_option))]
    pub related_request: Option<Box<SignatureContext>>,
}

impl From<&request::Parts> for SignatureContext {
    fn from(parts: &request::Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            status: None,
            headers: parts.headers.clone(),
            trailers: HeaderMap::new(),
            related_request: None,
        }
    }
}

impl SignatureContext {
    /// Build a response context; request metadata carries over so derived
    /// components stay resolvable
    #[must_use]
    pub fn for_response(parts: &response::Parts, request: &request::Parts) -> Self {
        Self {
            method: request.method.clone(),
            uri: request.uri.clone(),
            status: Some(parts.status),
            headers: parts.headers.clone(),
            trailers: HeaderMap::new(),
            related_request: Some(Box::new(Self::from(request))),
        }
    }
}
