//! Three-state scalars for partial-update wire fields.
//!
//! # Design
//! `Option<T>` cannot tell "leave this field alone" from "clear this field",
//! and update requests depend on exactly that distinction. `Nullable<T>`
//! keeps three states and maps each one to a distinct XML shape:
//!
//! | state         | element                            |
//! |---------------|------------------------------------|
//! | `Absent`      | not written                        |
//! | `Null`        | `<field nil="nil"/>`               |
//! | `Present(v)`  | `<field>canonical text</field>`    |
//!
//! Decoding follows one rule for every scalar kind: the `nil` attribute
//! always means `Null`; an element with no text and no marker is
//! `Present(zero)`; anything else must parse or the field fails with a
//! `CodecError`.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{CodecError, CodecErrorKind};
use crate::xml::Element;

/// Attribute marking an element as an explicit null.
pub const NIL_ATTRIBUTE: &str = "nil";

/// A scalar with a canonical text form on the wire.
pub trait Scalar: Sized {
    /// Value of an element that is present but empty.
    fn zero() -> Self;

    fn parse(raw: &str) -> Option<Self>;

    fn format(&self) -> String;

    /// Error kind reported when `parse` fails.
    fn invalid() -> CodecErrorKind;
}

impl Scalar for i64 {
    fn zero() -> Self {
        0
    }

    fn parse(raw: &str) -> Option<Self> {
        raw.parse().ok()
    }

    fn format(&self) -> String {
        self.to_string()
    }

    fn invalid() -> CodecErrorKind {
        CodecErrorKind::InvalidInteger
    }
}

impl Scalar for bool {
    fn zero() -> Self {
        false
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    fn format(&self) -> String {
        let text = if *self { "true" } else { "false" };
        text.to_string()
    }

    fn invalid() -> CodecErrorKind {
        CodecErrorKind::InvalidBoolean
    }
}

impl Scalar for DateTime<Utc> {
    fn zero() -> Self {
        DateTime::UNIX_EPOCH
    }

    fn parse(raw: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn format(&self) -> String {
        self.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn invalid() -> CodecErrorKind {
        CodecErrorKind::InvalidTimestamp
    }
}

/// A wire field that is absent, explicitly null, or present with a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    /// Not serialized at all; on update the server keeps its value.
    #[default]
    Absent,
    /// Serialized with the null marker; on update the server clears it.
    Null,
    Present(T),
}

pub type NullInt = Nullable<i64>;
pub type NullBool = Nullable<bool>;
pub type NullTime = Nullable<DateTime<Utc>>;

impl<T> Nullable<T> {
    pub fn present(value: T) -> Self {
        Nullable::Present(value)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Nullable::Present(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Nullable::Null)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Nullable::Absent)
    }

    /// The value when present, `None` for both `Absent` and `Null`.
    pub fn value(&self) -> Option<&T> {
        match self {
            Nullable::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Nullable::Present(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Nullable::Present(value)
    }
}

/// `None` maps to an explicit `Null`, not to `Absent`.
impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Nullable::Present(v),
            None => Nullable::Null,
        }
    }
}

pub(crate) fn is_nil(element: &Element) -> bool {
    matches!(element.attribute(NIL_ATTRIBUTE), Some("nil") | Some("true"))
}

impl<T: Scalar> Nullable<T> {
    /// Decode the element found under `field`, if any.
    pub fn decode(field: &str, element: Option<&Element>) -> Result<Self, CodecError> {
        let Some(element) = element else {
            return Ok(Nullable::Absent);
        };
        if is_nil(element) {
            return Ok(Nullable::Null);
        }
        if let Some(first) = element.children().first() {
            return Err(CodecError::new(
                field,
                format!("<{}>", first.name),
                CodecErrorKind::UnexpectedStructure,
            ));
        }
        let raw = element.text().trim();
        if raw.is_empty() {
            return Ok(Nullable::Present(T::zero()));
        }
        T::parse(raw)
            .map(Nullable::Present)
            .ok_or_else(|| CodecError::new(field, raw, T::invalid()))
    }

    /// Decode the child named `field` of `parent`.
    pub fn decode_child(parent: &Element, field: &str) -> Result<Self, CodecError> {
        Self::decode(field, parent.child(field))
    }

    /// Encode as an element named `field`; `Absent` yields nothing.
    pub fn encode(&self, field: &str) -> Option<Element> {
        match self {
            Nullable::Absent => None,
            Nullable::Null => Some(Element::new(field).with_attribute(NIL_ATTRIBUTE, NIL_ATTRIBUTE)),
            Nullable::Present(v) => Some(Element::new(field).with_text(v.format())),
        }
    }

    /// Encode into `parent` when not absent.
    pub fn encode_into(&self, parent: &mut Element, field: &str) {
        if let Some(element) = self.encode(field) {
            parent.push_child(element);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn roundtrip<T: Scalar + PartialEq + std::fmt::Debug>(state: Nullable<T>) {
        let encoded = state.encode("field");
        let decoded = Nullable::<T>::decode("field", encoded.as_ref()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn integer_states_roundtrip() {
        roundtrip::<i64>(Nullable::Absent);
        roundtrip::<i64>(Nullable::Null);
        for v in [0, 1, -1, 42, -9000, i64::MIN, i64::MAX] {
            roundtrip(Nullable::Present(v));
        }
    }

    #[test]
    fn boolean_states_roundtrip() {
        roundtrip::<bool>(Nullable::Absent);
        roundtrip::<bool>(Nullable::Null);
        roundtrip(Nullable::Present(true));
        roundtrip(Nullable::Present(false));
    }

    #[test]
    fn timestamp_states_roundtrip() {
        roundtrip::<DateTime<Utc>>(Nullable::Absent);
        roundtrip::<DateTime<Utc>>(Nullable::Null);
        roundtrip(Nullable::Present(DateTime::<Utc>::UNIX_EPOCH));
        roundtrip(Nullable::Present(Utc.with_ymd_and_hms(2011, 4, 19, 7, 0, 0).unwrap()));
        let precise = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(123);
        roundtrip(Nullable::Present(precise));
    }

    #[test]
    fn absent_encodes_to_nothing() {
        assert!(NullInt::Absent.encode("default_quantity").is_none());
        let mut parent = Element::new("add_on");
        NullBool::Absent.encode_into(&mut parent, "display_quantity_on_hosted_page");
        assert!(parent.children().is_empty());
    }

    #[test]
    fn null_encodes_marker_without_payload() {
        let el = NullInt::Null.encode("default_quantity").unwrap();
        assert_eq!(el.attribute("nil"), Some("nil"));
        assert!(el.text().is_empty());
        assert!(el.children().is_empty());
    }

    #[test]
    fn canonical_text_forms() {
        assert_eq!(NullInt::Present(-7).encode("n").unwrap().text(), "-7");
        assert_eq!(NullBool::Present(true).encode("b").unwrap().text(), "true");
        let ts = Utc.with_ymd_and_hms(2011, 4, 19, 7, 0, 0).unwrap();
        assert_eq!(
            NullTime::Present(ts).encode("t").unwrap().text(),
            "2011-04-19T07:00:00Z"
        );
    }

    #[test]
    fn leading_zeros_are_dropped_on_reencode() {
        let el = Element::new("n").with_text("007");
        let decoded = NullInt::decode("n", Some(&el)).unwrap();
        assert_eq!(decoded, NullInt::Present(7));
        assert_eq!(decoded.encode("n").unwrap().text(), "7");
    }

    #[test]
    fn empty_element_without_marker_is_zero_value() {
        let el = Element::new("f");
        assert_eq!(NullInt::decode("f", Some(&el)).unwrap(), NullInt::Present(0));
        assert_eq!(NullBool::decode("f", Some(&el)).unwrap(), NullBool::Present(false));
        assert_eq!(
            NullTime::decode("f", Some(&el)).unwrap(),
            NullTime::Present(DateTime::UNIX_EPOCH)
        );
        let blank = Element::new("f").with_text("  \n ");
        assert_eq!(NullInt::decode("f", Some(&blank)).unwrap(), NullInt::Present(0));
    }

    #[test]
    fn nil_marker_wins_over_content() {
        let el = Element::new("f").with_attribute("nil", "nil").with_text("12");
        assert_eq!(NullInt::decode("f", Some(&el)).unwrap(), NullInt::Null);
        let alt = Element::new("f").with_attribute("nil", "true");
        assert_eq!(NullBool::decode("f", Some(&alt)).unwrap(), NullBool::Null);
    }

    #[test]
    fn type_attribute_and_whitespace_are_ignored() {
        let el = Element::new("f").with_attribute("type", "integer").with_text(" 15 ");
        assert_eq!(NullInt::decode("f", Some(&el)).unwrap(), NullInt::Present(15));
        let offset = Element::new("t").with_text("2011-04-19T09:00:00+02:00");
        assert_eq!(
            NullTime::decode("t", Some(&offset)).unwrap(),
            NullTime::Present(Utc.with_ymd_and_hms(2011, 4, 19, 7, 0, 0).unwrap())
        );
    }

    #[test]
    fn malformed_content_names_field_and_raw() {
        let err = NullInt::decode("default_quantity", Some(&Element::new("x").with_text("abc")))
            .unwrap_err();
        assert_eq!(err.field, "default_quantity");
        assert_eq!(err.raw, "abc");
        assert_eq!(err.kind, CodecErrorKind::InvalidInteger);

        let overflow = Element::new("x").with_text("9223372036854775808");
        assert!(NullInt::decode("n", Some(&overflow)).is_err());

        let err = NullBool::decode("b", Some(&Element::new("x").with_text("yes"))).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::InvalidBoolean);

        let err = NullTime::decode("t", Some(&Element::new("x").with_text("yesterday")))
            .unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::InvalidTimestamp);
        assert_eq!(err.raw, "yesterday");
    }

    #[test]
    fn nested_elements_are_not_a_scalar() {
        let el = Element::new("f").with_child(Element::new("x").with_text("12"));
        let err = NullInt::decode("f", Some(&el)).unwrap_err();
        assert_eq!(err.field, "f");
        assert_eq!(err.raw, "<x>");
        assert_eq!(err.kind, CodecErrorKind::UnexpectedStructure);

        let empty_child = Element::new("b").with_child(Element::new("y"));
        assert_eq!(
            NullBool::decode("b", Some(&empty_child)).unwrap_err().kind,
            CodecErrorKind::UnexpectedStructure
        );

        let nil = Element::new("f")
            .with_attribute("nil", "nil")
            .with_child(Element::new("x"));
        assert_eq!(NullInt::decode("f", Some(&nil)).unwrap(), NullInt::Null);
    }

    #[test]
    fn accessors() {
        let p = NullInt::Present(3);
        assert!(p.is_present() && !p.is_null() && !p.is_absent());
        assert_eq!(p.value(), Some(&3));
        assert_eq!(NullInt::Null.value(), None);
        assert_eq!(NullInt::Absent.into_option(), None);
        assert_eq!(NullInt::default(), NullInt::Absent);
        assert_eq!(NullInt::from(Some(4)), NullInt::Present(4));
        assert_eq!(NullInt::from(None), NullInt::Null);
    }
}
