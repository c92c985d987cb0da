//! `Label: value` line parser.

use tracing::trace;

use super::ParsedFields;

/// Parse a free-text message into label/value pairs.
///
/// Each line is split on its first colon, so values may contain colons.
/// Labels are trimmed and lower-cased, values trimmed. Lines without a colon
/// or with an empty label are ignored. A repeated label keeps its last value.
pub fn parse_fields(text: &str) -> ParsedFields {
    let mut fields = ParsedFields::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        let key = key.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }

        trace!(key = %key, "parsed field");
        fields.insert(key, value.trim().to_string());
    }

    fields
}
