//! Free-text invoice request parsing and validation.

mod parser;
mod validator;

pub use parser::parse_fields;
pub use validator::{parse_amount, validate};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lower-cased label -> trimmed value, as produced by [`parse_fields`].
pub type ParsedFields = HashMap<String, String>;

/// Canonical invoice request fields, in the order they are requested from users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CustomerName,
    TaxId,
    Email,
    Description,
    Amount,
    PaymentMethod,
}

/// Accepted input labels per field, lower-cased. The first label is the one
/// shown to users. Adding a label or locale only touches this table.
pub const FIELD_LABELS: &[(Field, &[&str])] = &[
    (Field::CustomerName, &["nombre", "cliente"]),
    (Field::TaxId, &["cuit", "cuit/dni", "dni"]),
    (Field::Email, &["email", "e-mail", "correo"]),
    (Field::Description, &["descripción", "descripcion", "detalle"]),
    (Field::Amount, &["importe", "monto", "total"]),
    (Field::PaymentMethod, &["pago", "medio de pago", "forma de pago"]),
];

impl Field {
    /// All fields in canonical order.
    pub const ALL: [Field; 6] = [
        Field::CustomerName,
        Field::TaxId,
        Field::Email,
        Field::Description,
        Field::Amount,
        Field::PaymentMethod,
    ];

    /// Input labels accepted for this field.
    pub fn input_labels(self) -> &'static [&'static str] {
        FIELD_LABELS
            .iter()
            .find(|(field, _)| *field == self)
            .map(|(_, labels)| *labels)
            .unwrap_or(&[])
    }

    /// Label shown to users, as it appears in the instructions message.
    pub fn label(self) -> &'static str {
        match self {
            Field::CustomerName => "Nombre",
            Field::TaxId => "CUIT",
            Field::Email => "Email",
            Field::Description => "Descripción",
            Field::Amount => "Importe",
            Field::PaymentMethod => "Pago",
        }
    }

    /// Look up this field's value: the first accepted label present with a
    /// non-empty value wins.
    pub fn lookup(self, fields: &ParsedFields) -> Option<&str> {
        self.input_labels()
            .iter()
            .filter_map(|label| fields.get(*label))
            .map(String::as_str)
            .find(|value| !value.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_has_labels() {
        for field in Field::ALL {
            let labels = field.input_labels();
            assert!(!labels.is_empty(), "{field:?} has no labels");
            assert!(labels.iter().all(|l| *l == l.to_lowercase()));
        }
    }

    #[test]
    fn test_labels_are_unique_across_fields() {
        let mut seen = std::collections::HashSet::new();
        for (_, labels) in FIELD_LABELS {
            for label in *labels {
                assert!(seen.insert(*label), "duplicate label {label}");
            }
        }
    }

    #[test]
    fn test_lookup_prefers_table_order() {
        let mut fields = ParsedFields::new();
        fields.insert("detalle".into(), "Sandalias".into());
        fields.insert("descripción".into(), "Zapatos".into());

        assert_eq!(Field::Description.lookup(&fields), Some("Zapatos"));
    }

    #[test]
    fn test_lookup_skips_empty_values() {
        let mut fields = ParsedFields::new();
        fields.insert("nombre".into(), String::new());
        fields.insert("cliente".into(), "Ana".into());

        assert_eq!(Field::CustomerName.lookup(&fields), Some("Ana"));
        assert_eq!(Field::Email.lookup(&fields), None);
    }
}
