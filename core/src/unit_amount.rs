//! Money amounts in minor units, single- or multi-currency.
//!
//! A plan priced in one currency sends the bare value:
//!
//! ```xml
//! <unit_amount_in_cents type="integer">1000</unit_amount_in_cents>
//! ```
//!
//! A multi-currency plan sends one sub-element per currency code:
//!
//! ```xml
//! <unit_amount_in_cents>
//!   <USD type="integer">1000</USD>
//!   <EUR type="integer">800</EUR>
//! </unit_amount_in_cents>
//! ```

use std::collections::BTreeMap;

use crate::error::{CodecError, CodecErrorKind};
use crate::nullable::{is_nil, NullInt, Nullable};
use crate::xml::Element;

/// An amount in minor units (cents). At most one form is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitAmount {
    /// Single-currency form.
    pub amount: NullInt,
    /// Multi-currency form, keyed by currency code.
    pub currencies: BTreeMap<String, i64>,
}

impl UnitAmount {
    pub fn single(amount: i64) -> Self {
        Self {
            amount: Nullable::Present(amount),
            currencies: BTreeMap::new(),
        }
    }

    pub fn multi<I, C>(amounts: I) -> Self
    where
        I: IntoIterator<Item = (C, i64)>,
        C: Into<String>,
    {
        Self {
            amount: Nullable::Absent,
            currencies: amounts.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.amount.is_absent() && self.currencies.is_empty()
    }

    pub fn is_multi_currency(&self) -> bool {
        !self.currencies.is_empty()
    }

    /// Amount charged in `currency`; the single form applies to any currency.
    pub fn amount_for(&self, currency: &str) -> Option<i64> {
        if self.is_multi_currency() {
            return self.currencies.get(currency).copied();
        }
        self.amount.value().copied()
    }

    pub fn decode(field: &str, element: Option<&Element>) -> Result<Self, CodecError> {
        let Some(element) = element else {
            return Ok(Self::default());
        };
        if is_nil(element) {
            return Ok(Self {
                amount: Nullable::Null,
                currencies: BTreeMap::new(),
            });
        }
        if element.children().is_empty() {
            return Ok(Self {
                amount: NullInt::decode(field, Some(element))?,
                currencies: BTreeMap::new(),
            });
        }
        if element.has_text() {
            return Err(CodecError::new(
                field,
                element.text().trim(),
                CodecErrorKind::ConflictingAmountForms,
            ));
        }

        let mut currencies = BTreeMap::new();
        for child in element.children() {
            let path = format!("{field}.{}", child.name);
            if let Nullable::Present(v) = NullInt::decode(&path, Some(child))? {
                currencies.insert(child.name.clone(), v);
            }
        }
        // Every currency cleared: keep the field present as an explicit null.
        let amount = if currencies.is_empty() {
            Nullable::Null
        } else {
            Nullable::Absent
        };
        Ok(Self { amount, currencies })
    }

    pub fn decode_child(parent: &Element, field: &str) -> Result<Self, CodecError> {
        Self::decode(field, parent.child(field))
    }

    pub fn encode(&self, field: &str) -> Result<Option<Element>, CodecError> {
        if !self.is_multi_currency() {
            return Ok(self.amount.encode(field));
        }
        if !self.amount.is_absent() {
            return Err(CodecError::new(
                field,
                format!("{:?}", self.amount),
                CodecErrorKind::ConflictingAmountForms,
            ));
        }
        let mut element = Element::new(field);
        for (currency, amount) in &self.currencies {
            element.push_child(Element::new(currency.as_str()).with_text(amount.to_string()));
        }
        Ok(Some(element))
    }

    pub fn encode_into(&self, parent: &mut Element, field: &str) -> Result<(), CodecError> {
        if let Some(element) = self.encode(field)? {
            parent.push_child(element);
        }
        Ok(())
    }

    /// Reject negative values in either form.
    pub fn ensure_non_negative(&self, field: &str) -> Result<(), CodecError> {
        if let Nullable::Present(v) = self.amount {
            if v < 0 {
                return Err(CodecError::new(field, v.to_string(), CodecErrorKind::NegativeAmount));
            }
        }
        for (currency, v) in &self.currencies {
            if *v < 0 {
                return Err(CodecError::new(
                    format!("{field}.{currency}"),
                    v.to_string(),
                    CodecErrorKind::NegativeAmount,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    const FIELD: &str = "unit_amount_in_cents";

    #[test]
    fn bare_value_decodes_to_single_form() {
        let el = parse_document(r#"<unit_amount_in_cents type="integer">1000</unit_amount_in_cents>"#)
            .unwrap();
        let amount = UnitAmount::decode(FIELD, Some(&el)).unwrap();
        assert_eq!(amount.amount, NullInt::Present(1000));
        assert!(amount.currencies.is_empty());
        assert_eq!(amount.amount_for("USD"), Some(1000));
    }

    #[test]
    fn currency_children_decode_to_mapping_form() {
        let el = parse_document(
            r#"<unit_amount_in_cents>
                 <USD type="integer">1000</USD>
                 <EUR type="integer">800</EUR>
                 <GBP type="integer">700</GBP>
               </unit_amount_in_cents>"#,
        )
        .unwrap();
        let amount = UnitAmount::decode(FIELD, Some(&el)).unwrap();
        assert!(amount.amount.is_absent());
        assert_eq!(amount.currencies.len(), 3);
        assert_eq!(amount.amount_for("EUR"), Some(800));
        assert_eq!(amount.amount_for("JPY"), None);
    }

    #[test]
    fn both_forms_fail_to_decode() {
        let el = parse_document(
            "<unit_amount_in_cents>1000<USD>1000</USD></unit_amount_in_cents>",
        )
        .unwrap();
        let err = UnitAmount::decode(FIELD, Some(&el)).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::ConflictingAmountForms);
        assert_eq!(err.field, FIELD);
        assert_eq!(err.raw, "1000");
    }

    #[test]
    fn absent_and_null() {
        assert!(UnitAmount::decode(FIELD, None).unwrap().is_absent());
        let nil = Element::new(FIELD).with_attribute("nil", "nil");
        let amount = UnitAmount::decode(FIELD, Some(&nil)).unwrap();
        assert!(amount.amount.is_null());
        assert!(!amount.is_absent());
        assert_eq!(amount.encode(FIELD).unwrap(), Some(nil));
    }

    #[test]
    fn all_null_currencies_stay_present_as_null() {
        let el = parse_document(r#"<unit_amount_in_cents><USD nil="nil"/></unit_amount_in_cents>"#)
            .unwrap();
        let amount = UnitAmount::decode(FIELD, Some(&el)).unwrap();
        assert!(!amount.is_absent());
        assert!(amount.amount.is_null());
        assert!(amount.currencies.is_empty());

        let reencoded = amount.encode(FIELD).unwrap().unwrap();
        assert_eq!(reencoded.attribute("nil"), Some("nil"));
        assert_eq!(UnitAmount::decode(FIELD, Some(&reencoded)).unwrap(), amount);
    }

    #[test]
    fn null_currency_is_dropped_beside_present_ones() {
        let el = parse_document(
            r#"<unit_amount_in_cents><USD>500</USD><EUR nil="nil"/></unit_amount_in_cents>"#,
        )
        .unwrap();
        let amount = UnitAmount::decode(FIELD, Some(&el)).unwrap();
        assert!(amount.amount.is_absent());
        assert_eq!(amount.currencies.len(), 1);
        assert_eq!(amount.amount_for("EUR"), None);
    }

    #[test]
    fn nested_currency_content_is_rejected() {
        let el = parse_document("<unit_amount_in_cents><USD><x>1</x></USD></unit_amount_in_cents>")
            .unwrap();
        let err = UnitAmount::decode(FIELD, Some(&el)).unwrap_err();
        assert_eq!(err.field, "unit_amount_in_cents.USD");
        assert_eq!(err.kind, CodecErrorKind::UnexpectedStructure);
    }

    #[test]
    fn malformed_currency_value_names_nested_field() {
        let el = parse_document("<unit_amount_in_cents><USD>ten</USD></unit_amount_in_cents>").unwrap();
        let err = UnitAmount::decode(FIELD, Some(&el)).unwrap_err();
        assert_eq!(err.field, "unit_amount_in_cents.USD");
        assert_eq!(err.raw, "ten");
    }

    #[test]
    fn encode_emits_one_child_per_currency() {
        let amount = UnitAmount::multi([("USD", 1000), ("EUR", 800)]);
        let el = amount.encode(FIELD).unwrap().unwrap();
        assert_eq!(el.children().len(), 2);
        assert_eq!(el.child("USD").unwrap().text(), "1000");
        assert!(!el.has_text());
        assert_eq!(UnitAmount::decode(FIELD, Some(&el)).unwrap(), amount);
    }

    #[test]
    fn encode_single_and_absent() {
        let el = UnitAmount::single(250).encode(FIELD).unwrap().unwrap();
        assert_eq!(el.text(), "250");
        assert_eq!(UnitAmount::default().encode(FIELD).unwrap(), None);
    }

    #[test]
    fn encode_rejects_both_forms() {
        let mut amount = UnitAmount::multi([("USD", 1)]);
        amount.amount = NullInt::Present(1);
        let err = amount.encode(FIELD).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::ConflictingAmountForms);
    }

    #[test]
    fn negative_amounts_are_rejected_when_required() {
        let err = UnitAmount::single(-5).ensure_non_negative(FIELD).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::NegativeAmount);
        assert_eq!(err.raw, "-5");

        let err = UnitAmount::multi([("USD", 10), ("EUR", -1)])
            .ensure_non_negative(FIELD)
            .unwrap_err();
        assert_eq!(err.field, "unit_amount_in_cents.EUR");
        assert!(UnitAmount::single(0).ensure_non_negative(FIELD).is_ok());
    }
}
