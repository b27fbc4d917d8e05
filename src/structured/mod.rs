//!
//! Structured field values as defined by RFC 8941
//!
//! Every header this crate deals with (`Signature-Input`, `Signature`,
//! `Content-Digest`, `Want-Content-Digest`) is expressed in this grammar,
//! so the model, parser, and serializer live at the bottom of the crate.
//!

use indexmap::IndexMap;
use miette::Diagnostic;
use std::borrow::Borrow;
use thiserror::Error;

pub use self::parse::{ParseError, ParseErrorKind};

mod parse;
mod serialise;

/// Largest absolute value an SF integer may take (15 decimal digits)
pub const MAX_INTEGER: i64 = 999_999_999_999_999;

/// Largest absolute value of the integer component of an SF decimal (12 digits)
const MAX_DECIMAL_INTEGER_COMPONENT: i64 = 999_999_999_999;

#[derive(Clone, Copy, Debug, Diagnostic, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("integer out of range")]
    IntegerOutOfRange,

    #[error("decimal out of range")]
    DecimalOutOfRange,

    #[error("string contains characters outside printable ASCII")]
    InvalidString,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid key")]
    InvalidKey,
}

/// Signed integer restricted to 15 decimal digits
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Integer(i64);

impl Integer {
    pub fn new(value: i64) -> Result<Self, ValueError> {
        if value.checked_abs().is_none_or(|abs| abs > MAX_INTEGER) {
            return Err(ValueError::IntegerOutOfRange);
        }

        Ok(Self(value))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Integer {
    type Error = ValueError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Fixed-point decimal with three fractional digits
///
/// Stored as a scaled integer of thousandths. The integer component is
/// limited to 12 digits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal(i64);

impl Decimal {
    /// Construct from a raw count of thousandths
    pub fn from_thousandths(thousandths: i64) -> Result<Self, ValueError> {
        if (thousandths / 1000).abs() > MAX_DECIMAL_INTEGER_COMPONENT {
            return Err(ValueError::DecimalOutOfRange);
        }

        Ok(Self(thousandths))
    }

    #[inline]
    #[must_use]
    pub fn thousandths(self) -> i64 {
        self.0
    }
}

impl TryFrom<f64> for Decimal {
    type Error = ValueError;

    /// Rounds to three fractional digits using half-even rounding
    ///
    /// Rounding happens in decimal over the value's shortest decimal
    /// representation, so `1.0015` is a genuine tie and rounds to `1.002`.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(ValueError::DecimalOutOfRange);
        }

        let formatted = format!("{}", value.abs());
        let (integer_part, fraction_part) = formatted
            .split_once('.')
            .unwrap_or((formatted.as_str(), ""));
        if integer_part.len() > 12 {
            return Err(ValueError::DecimalOutOfRange);
        }

        let integer: i64 = integer_part
            .parse()
            .map_err(|_| ValueError::DecimalOutOfRange)?;

        let kept = &fraction_part[..fraction_part.len().min(3)];
        let mut fraction: i64 = format!("{kept:0<3}")
            .parse()
            .map_err(|_| ValueError::DecimalOutOfRange)?;

        let rest = &fraction_part[kept.len()..];
        let mut rest_digits = rest.bytes().map(|digit| digit - b'0');
        match rest_digits.next() {
            Some(first) if first > 5 => fraction += 1,
            Some(5) => {
                if rest_digits.any(|digit| digit != 0) || fraction % 2 == 1 {
                    fraction += 1;
                }
            }
            _ => {}
        }

        let thousandths = integer * 1000 + fraction;
        Self::from_thousandths(if value.is_sign_negative() {
            -thousandths
        } else {
            thousandths
        })
    }
}

/// ASCII string limited to the printable range (%x20-%x7E)
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SfString(String);

impl SfString {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        if value.bytes().all(|b| (0x20..=0x7E).contains(&b)) {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidString)
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[inline]
fn is_tchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Token per RFC 8941: `(ALPHA / "*") *(tchar / ":" / "/")`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        let mut bytes = value.bytes();

        let valid_first = bytes
            .next()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'*');
        if valid_first && bytes.all(|b| is_tchar(b) || b == b':' || b == b'/') {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidToken)
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Parameter/dictionary key: `(lcalpha / "*") *(lcalpha / DIGIT / "_" / "-" / "." / "*")`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        let value = value.into();
        let mut bytes = value.bytes();

        let valid_first = bytes
            .next()
            .is_some_and(|b| b.is_ascii_lowercase() || b == b'*');
        let valid_rest = bytes.all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || b"_-.*".contains(&b)
        });

        if valid_first && valid_rest {
            Ok(Self(value))
        } else {
            Err(ValueError::InvalidKey)
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A bare item, without parameters
#[derive(Clone, Debug, PartialEq)]
pub enum BareItem {
    Integer(Integer),
    Decimal(Decimal),
    String(SfString),
    Token(Token),
    ByteSequence(Vec<u8>),
    Boolean(bool),
}

impl BareItem {
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(value.get()),
            _ => None,
        }
    }

    /// Decimal value in thousandths; integers coerce losslessly
    #[must_use]
    pub fn as_decimal(&self) -> Option<i64> {
        match self {
            Self::Decimal(value) => Some(value.thousandths()),
            Self::Integer(value) => value.get().checked_mul(1000),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> Option<&str> {
        match self {
            Self::Token(value) => Some(value.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::ByteSequence(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<Integer> for BareItem {
    fn from(value: Integer) -> Self {
        Self::Integer(value)
    }
}

impl From<Decimal> for BareItem {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<SfString> for BareItem {
    fn from(value: SfString) -> Self {
        Self::String(value)
    }
}

impl From<Token> for BareItem {
    fn from(value: Token) -> Self {
        Self::Token(value)
    }
}

impl From<Vec<u8>> for BareItem {
    fn from(value: Vec<u8>) -> Self {
        Self::ByteSequence(value)
    }
}

impl From<bool> for BareItem {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Ordered `Key -> BareItem` mapping attached to items and inner lists
///
/// Insertion order is preserved on round-trip. Inserting an existing key
/// overwrites the value but keeps the original position, matching the RFC
/// parsing semantics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    inner: IndexMap<Key, BareItem>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Key, value: impl Into<BareItem>) {
        self.inner.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BareItem> {
        self.inner.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &BareItem)> {
        self.inner.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

/// An item with its parameters
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub bare: BareItem,
    pub params: Parameters,
}

impl Item {
    #[must_use]
    pub fn new(bare: impl Into<BareItem>) -> Self {
        Self {
            bare: bare.into(),
            params: Parameters::new(),
        }
    }

    #[must_use]
    pub fn with_params(bare: impl Into<BareItem>, params: Parameters) -> Self {
        Self {
            bare: bare.into(),
            params,
        }
    }

    /// Parse a complete field value as a single item
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse::item(input)
    }

    #[must_use]
    pub fn serialise(&self) -> String {
        serialise::item(self)
    }
}

/// An ordered sequence of items wrapped in parentheses
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InnerList {
    pub items: Vec<Item>,
    pub params: Parameters,
}

impl InnerList {
    #[must_use]
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            params: Parameters::new(),
        }
    }

    #[must_use]
    pub fn serialise(&self) -> String {
        serialise::inner_list(self)
    }
}

/// A list/dictionary member: either a single item or an inner list
#[derive(Clone, Debug, PartialEq)]
pub enum ListEntry {
    Item(Item),
    InnerList(InnerList),
}

impl ListEntry {
    #[must_use]
    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::InnerList(..) => None,
        }
    }

    #[must_use]
    pub fn as_inner_list(&self) -> Option<&InnerList> {
        match self {
            Self::InnerList(list) => Some(list),
            Self::Item(..) => None,
        }
    }
}

impl From<Item> for ListEntry {
    fn from(value: Item) -> Self {
        Self::Item(value)
    }
}

impl From<InnerList> for ListEntry {
    fn from(value: InnerList) -> Self {
        Self::InnerList(value)
    }
}

/// Top-level structured list
#[derive(Clone, Debug, Default, PartialEq)]
pub struct List(pub Vec<ListEntry>);

impl List {
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse::list(input)
    }

    /// An empty list serialises to the empty string
    #[must_use]
    pub fn serialise(&self) -> String {
        serialise::list(self)
    }
}

/// Top-level structured dictionary
///
/// Duplicate keys on parse: the last value wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    inner: IndexMap<Key, ListEntry>,
}

impl Dictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse::dictionary(input)
    }

    pub fn insert(&mut self, key: Key, value: impl Into<ListEntry>) {
        self.inner.insert(key, value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ListEntry> {
        self.inner.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &ListEntry)> {
        self.inner.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// An empty dictionary serialises to the empty string
    #[must_use]
    pub fn serialise(&self) -> String {
        serialise::dictionary(self)
    }
}

#[derive(Debug, Diagnostic, Error)]
pub enum StructuredError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Value(#[from] ValueError),
}
