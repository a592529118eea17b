//! Record types for the billing API.
//!
//! # Design
//! Plain string fields follow the server's convention of omitting empty
//! values, so an empty string never overwrites anything on update. Fields
//! whose "clear it" intent matters use the three-state `Nullable` types.

use crate::error::CodecError;
use crate::nullable::{NullBool, NullInt, NullTime};
use crate::resource::{push_string_field, string_field, Resource};
use crate::unit_amount::UnitAmount;
use crate::xml::Element;

/// An add-on attached to a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOn {
    pub code: String,
    pub name: String,
    pub default_quantity: NullInt,
    pub display_quantity_on_hosted_page: NullBool,
    pub tax_code: String,
    pub unit_amount_in_cents: UnitAmount,
    pub accounting_code: String,
    pub created_at: NullTime,
}

impl AddOn {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }
}

impl Resource for AddOn {
    const PARENT_SEGMENT: &'static str = "plans";
    const SEGMENT: &'static str = "add_ons";
    const ELEMENT: &'static str = "add_on";
    const LIST_ELEMENT: &'static str = "add_ons";

    fn from_element(el: &Element) -> Result<Self, CodecError> {
        let unit_amount_in_cents = UnitAmount::decode_child(el, "unit_amount_in_cents")?;
        unit_amount_in_cents.ensure_non_negative("unit_amount_in_cents")?;
        Ok(Self {
            code: string_field(el, "add_on_code"),
            name: string_field(el, "name"),
            default_quantity: NullInt::decode_child(el, "default_quantity")?,
            display_quantity_on_hosted_page: NullBool::decode_child(
                el,
                "display_quantity_on_hosted_page",
            )?,
            tax_code: string_field(el, "tax_code"),
            unit_amount_in_cents,
            accounting_code: string_field(el, "accounting_code"),
            created_at: NullTime::decode_child(el, "created_at")?,
        })
    }

    fn to_element(&self) -> Result<Element, CodecError> {
        self.unit_amount_in_cents
            .ensure_non_negative("unit_amount_in_cents")?;

        let mut el = Element::new(Self::ELEMENT);
        push_string_field(&mut el, "add_on_code", &self.code);
        push_string_field(&mut el, "name", &self.name);
        self.default_quantity.encode_into(&mut el, "default_quantity");
        self.display_quantity_on_hosted_page
            .encode_into(&mut el, "display_quantity_on_hosted_page");
        push_string_field(&mut el, "tax_code", &self.tax_code);
        self.unit_amount_in_cents
            .encode_into(&mut el, "unit_amount_in_cents")?;
        push_string_field(&mut el, "accounting_code", &self.accounting_code);
        self.created_at.encode_into(&mut el, "created_at");
        Ok(el)
    }
}
