//! Resource schema shared by every CRUD operation.
//!
//! # Design
//! A resource type is described as data: where it lives in the URL space,
//! which elements wrap it on the wire, and how a single record maps to and
//! from an `Element`. `BillingClient` and `Service` are generic over this
//! trait, so adding a resource means adding a record type and one impl.

use crate::error::{CodecError, CodecErrorKind};
use crate::xml::Element;

/// A record addressed as `{PARENT_SEGMENT}/{parent_code}/{SEGMENT}/{code}`.
pub trait Resource: Sized {
    /// Collection of the owning parent, e.g. `plans`.
    const PARENT_SEGMENT: &'static str;
    /// Collection of this resource under its parent, e.g. `add_ons`.
    const SEGMENT: &'static str;
    /// Root element of a single record, e.g. `add_on`.
    const ELEMENT: &'static str;
    /// Root element of a list response, e.g. `add_ons`.
    const LIST_ELEMENT: &'static str;

    /// Decode a record from an element already known to be `ELEMENT`.
    fn from_element(element: &Element) -> Result<Self, CodecError>;

    /// Encode a record as an `ELEMENT` element.
    fn to_element(&self) -> Result<Element, CodecError>;
}

/// Fail unless `element` is named `expected`.
pub(crate) fn expect_element(element: &Element, expected: &str) -> Result<(), CodecError> {
    if element.name == expected {
        return Ok(());
    }
    Err(CodecError::new(
        element.name.as_str(),
        element.name.as_str(),
        CodecErrorKind::UnexpectedElement {
            expected: expected.to_string(),
        },
    ))
}

pub(crate) fn decode_record<R: Resource>(element: &Element) -> Result<R, CodecError> {
    expect_element(element, R::ELEMENT)?;
    R::from_element(element)
}

pub(crate) fn decode_list<R: Resource>(element: &Element) -> Result<Vec<R>, CodecError> {
    expect_element(element, R::LIST_ELEMENT)?;
    element
        .children()
        .iter()
        .filter(|child| child.name == R::ELEMENT)
        .map(R::from_element)
        .collect()
}

/// Text of a plain string field; missing elements read as empty.
pub fn string_field(parent: &Element, field: &str) -> String {
    parent
        .child(field)
        .map(|el| el.text().to_string())
        .unwrap_or_default()
}

/// Write a plain string field, omitting it when empty.
pub fn push_string_field(parent: &mut Element, field: &str, value: &str) {
    if !value.is_empty() {
        parent.push_child(Element::new(field).with_text(value));
    }
}
