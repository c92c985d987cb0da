//! Required-field and amount validation.

use std::collections::BTreeSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::{Field, ParsedFields};
use crate::error::ValidationError;
use crate::models::invoice::InvoiceRequest;

lazy_static! {
    // Optional currency sign and `+`, integer digits, optional single `.` or
    // `,` decimal part. Either side of the separator may be empty.
    static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"^\$?\s*\+?([0-9]*)(?:[.,]([0-9]*))?$"
    ).unwrap();
}

/// Build an [`InvoiceRequest`] from parsed fields.
///
/// Every missing field is reported at once. The amount is only checked once
/// all fields are present. Tax ID and email formats are not checked.
pub fn validate(fields: &ParsedFields) -> Result<InvoiceRequest, ValidationError> {
    let missing: BTreeSet<Field> = Field::ALL
        .into_iter()
        .filter(|field| field.lookup(fields).is_none())
        .collect();

    if !missing.is_empty() {
        debug!(?missing, "request is missing fields");
        return Err(ValidationError::MissingFields { missing });
    }

    let get = |field: Field| field.lookup(fields).unwrap_or_default().to_string();

    let raw_amount = get(Field::Amount);
    let amount = parse_amount(&raw_amount).ok_or(ValidationError::InvalidAmount {
        value: raw_amount.clone(),
    })?;

    Ok(InvoiceRequest::new(
        get(Field::CustomerName),
        get(Field::TaxId),
        get(Field::Email),
        get(Field::Description),
        amount,
        get(Field::PaymentMethod),
    ))
}

/// Parse a non-negative amount such as `12345.67`, `12345,67`, `$ 100`,
/// `.5` or `5.`. At least one digit is required.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let caps = AMOUNT_PATTERN.captures(s.trim())?;

    let integer = caps.get(1).map_or("", |m| m.as_str());
    let fraction = caps.get(2).map_or("", |m| m.as_str());
    if integer.is_empty() && fraction.is_empty() {
        return None;
    }

    let integer = if integer.is_empty() { "0" } else { integer };
    let normalized = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    };

    Decimal::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::parse_fields;
    use pretty_assertions::assert_eq;

    fn complete() -> ParsedFields {
        parse_fields(
            "Nombre: Juan Pérez\n\
             CUIT: 20-12345678-9\n\
             Email: juan@example.com\n\
             Descripción: Zapatos\n\
             Importe: 12345.67\n\
             Pago: Transferencia",
        )
    }

    #[test]
    fn test_validate_complete_request() {
        let request = validate(&complete()).unwrap();

        assert_eq!(request.customer_name(), "Juan Pérez");
        assert_eq!(request.tax_id(), "20-12345678-9");
        assert_eq!(request.email(), "juan@example.com");
        assert_eq!(request.description(), "Zapatos");
        assert_eq!(request.amount(), Decimal::from_str("12345.67").unwrap());
        assert_eq!(request.payment_method(), "Transferencia");
    }

    #[test]
    fn test_reports_every_missing_field() {
        let fields = parse_fields("Nombre: Ana\nPago: Efectivo");

        let err = validate(&fields).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                missing: BTreeSet::from([
                    Field::TaxId,
                    Field::Email,
                    Field::Description,
                    Field::Amount,
                ]),
            }
        );
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut fields = complete();
        fields.insert("email".into(), String::new());

        let err = validate(&fields).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingFields {
                missing: BTreeSet::from([Field::Email]),
            }
        );
    }

    #[test]
    fn test_missing_fields_win_over_bad_amount() {
        let fields = parse_fields("Importe: muchos");
        assert!(matches!(
            validate(&fields),
            Err(ValidationError::MissingFields { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        for bad in [
            "abc", "-5", "-0.01", "1e5", "12.34.56", "12,345.67", "$", "NaN", "١٢٣", ".", "+", "+-5",
        ] {
            let mut fields = complete();
            fields.insert("importe".into(), bad.into());

            assert_eq!(
                validate(&fields),
                Err(ValidationError::InvalidAmount { value: bad.into() }),
                "amount {bad:?}"
            );
        }
    }

    #[test]
    fn test_accepts_alternative_labels() {
        let fields = parse_fields(
            "Cliente: Ana\nDNI: 30111222\nCorreo: ana@example.com\n\
             Detalle: Botas\nMonto: 100\nForma de pago: Efectivo",
        );

        let request = validate(&fields).unwrap();
        assert_eq!(request.customer_name(), "Ana");
        assert_eq!(request.amount(), Decimal::from(100));
    }

    #[test]
    fn test_parse_amount_forms() {
        assert_eq!(parse_amount("12345.67"), Some(Decimal::from_str("12345.67").unwrap()));
        assert_eq!(parse_amount("12345,67"), Some(Decimal::from_str("12345.67").unwrap()));
        assert_eq!(parse_amount(" $ 100 "), Some(Decimal::from(100)));
        assert_eq!(parse_amount("0"), Some(Decimal::ZERO));
        assert_eq!(parse_amount(".5"), Some(Decimal::from_str("0.5").unwrap()));
        assert_eq!(parse_amount("5."), Some(Decimal::from(5)));
        assert_eq!(parse_amount("+5"), Some(Decimal::from(5)));
        assert_eq!(parse_amount("$+12,50"), Some(Decimal::from_str("12.50").unwrap()));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("99999999999999999999999999999999"), None);
    }
}
