// CLI parsing utilities for lead commands

use crate::utils::fuzzy::levenshtein_distance;

/// Parsed lead arguments from command line
///
/// Bare words accumulate into `contact`; `field=value` tokens fill the
/// named fields. Values are kept as raw strings - the handlers validate
/// them (deal value, stage name) so error messages can name the command.
#[derive(Debug, Default)]
pub struct ParsedLeadArgs {
    pub contact: Vec<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub value: Option<String>,
    pub source: Option<String>,
    pub note: Option<String>,
    pub stage: Option<String>,
}

/// Field name parse error
#[derive(Debug)]
pub enum FieldParseError {
    InvalidFieldName {
        field: String,
        suggestion: String,
    },
    ReadOnlyField {
        field: String,
        hint: String,
    },
    UnknownFieldToken {
        token: String,
    },
}

impl std::fmt::Display for FieldParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldParseError::InvalidFieldName { field, suggestion } => {
                write!(f, "Unrecognized field name '{}'\n  Did you mean '{}'?", field, suggestion)
            }
            FieldParseError::ReadOnlyField { field, hint } => {
                write!(f, "Field '{}' cannot be modified directly.\n  {}", field, hint)
            }
            FieldParseError::UnknownFieldToken { token } => {
                write!(f, "Unrecognized field token '{}'\n  If this is meant to be part of the contact name, remove the equals sign or quote the whole name.", token)
            }
        }
    }
}

/// Valid field names (exact match only, no abbreviations)
const FIELD_NAMES: &[&str] = &[
    "company",
    "email",
    "phone",
    "value",
    "source",
    "note",
    "stage",
];

/// Fields that are never settable through add/modify tokens
/// These exist to give helpful error messages when users try to set them
const READ_ONLY_FIELDS: &[&str] = &[
    "position",    // Use the move command instead
    "id",          // Immutable
    "created",     // Immutable
    "modified",    // Automatically updated
];

/// Find the most similar field name using fuzzy matching
fn find_similar_field_name(field: &str) -> Option<String> {
    let mut best_match: Option<(&str, usize)> = None;

    for name in FIELD_NAMES {
        let distance = levenshtein_distance(&field.to_lowercase(), &name.to_lowercase());
        if distance <= 3 {
            match best_match {
                None => best_match = Some((name, distance)),
                Some((_, best_dist)) if distance < best_dist => {
                    best_match = Some((name, distance));
                }
                _ => {}
            }
        }
    }

    best_match.map(|(name, _)| name.to_string())
}

/// Get hint for read-only field
fn get_read_only_hint(field: &str) -> String {
    match field.to_lowercase().as_str() {
        "position" => "Use 'pipetrack move <id> [stage] --to <position>' to reposition a lead on the board.".to_string(),
        "id" => "Lead ID is assigned automatically and cannot be changed.".to_string(),
        "created" => "Created timestamp is set automatically and cannot be changed.".to_string(),
        "modified" => "Modified timestamp is updated automatically.".to_string(),
        _ => "This field is read-only.".to_string(),
    }
}

/// Parse a field token (field=value)
/// Returns None when the token has no '=' (part of the contact name).
/// Empty values (field=) are normalized to "none" so modify can clear them.
fn parse_field_token(token: &str) -> Result<Option<(String, String)>, FieldParseError> {
    if let Some(eq_pos) = token.find('=') {
        let field = token[..eq_pos].to_string();
        let value = token[eq_pos + 1..].to_string();

        let final_value = if value.is_empty() {
            "none".to_string()
        } else {
            value
        };

        // Check for read-only fields first
        if READ_ONLY_FIELDS.iter().any(|f| f.eq_ignore_ascii_case(&field)) {
            return Err(FieldParseError::ReadOnlyField {
                field: field.clone(),
                hint: get_read_only_hint(&field),
            });
        }

        if FIELD_NAMES.iter().any(|f| f.eq_ignore_ascii_case(&field)) {
            return Ok(Some((field.to_lowercase(), final_value)));
        }

        // Unknown field name - suggest a close match if there is one
        if let Some(suggestion) = find_similar_field_name(&field) {
            return Err(FieldParseError::InvalidFieldName {
                field,
                suggestion,
            });
        }

        return Err(FieldParseError::UnknownFieldToken {
            token: token.to_string(),
        });
    }

    Ok(None)
}

/// Parse lead arguments (bare words + field=value tokens)
pub fn parse_lead_args(args: &[String]) -> Result<ParsedLeadArgs, FieldParseError> {
    let mut parsed = ParsedLeadArgs::default();

    for token in args {
        match parse_field_token(token)? {
            Some((field, value)) => match field.as_str() {
                "company" => parsed.company = Some(value),
                "email" => parsed.email = Some(value),
                "phone" => parsed.phone = Some(value),
                "value" => parsed.value = Some(value),
                "source" => parsed.source = Some(value),
                "note" => parsed.note = Some(value),
                "stage" => parsed.stage = Some(value),
                _ => unreachable!("field names are checked in parse_field_token"),
            },
            None => parsed.contact.push(token.clone()),
        }
    }

    Ok(parsed)
}

/// Join contact name words into a single name
pub fn join_contact(words: &[String]) -> String {
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_parse_bare_words_become_contact() {
        let parsed = parse_lead_args(&args(&["Ana", "Soto"])).unwrap();
        assert_eq!(join_contact(&parsed.contact), "Ana Soto");
        assert!(parsed.company.is_none());
    }

    #[test]
    fn test_parse_fields() {
        let parsed = parse_lead_args(&args(&[
            "Ana", "Soto",
            "company=Soto Ltd",
            "email=ana@soto.example",
            "value=25000",
            "stage=quotation",
        ])).unwrap();
        assert_eq!(join_contact(&parsed.contact), "Ana Soto");
        assert_eq!(parsed.company.as_deref(), Some("Soto Ltd"));
        assert_eq!(parsed.email.as_deref(), Some("ana@soto.example"));
        assert_eq!(parsed.value.as_deref(), Some("25000"));
        assert_eq!(parsed.stage.as_deref(), Some("quotation"));
    }

    #[test]
    fn test_parse_empty_value_becomes_none() {
        let parsed = parse_lead_args(&args(&["note="])).unwrap();
        assert_eq!(parsed.note.as_deref(), Some("none"));
    }

    #[test]
    fn test_parse_position_is_read_only() {
        let err = parse_lead_args(&args(&["position=2"])).unwrap_err();
        match err {
            FieldParseError::ReadOnlyField { field, hint } => {
                assert_eq!(field, "position");
                assert!(hint.contains("move"));
            }
            other => panic!("expected ReadOnlyField, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_misspelled_field_suggests() {
        let err = parse_lead_args(&args(&["compny=Acme"])).unwrap_err();
        match err {
            FieldParseError::InvalidFieldName { field, suggestion } => {
                assert_eq!(field, "compny");
                assert_eq!(suggestion, "company");
            }
            other => panic!("expected InvalidFieldName, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_token() {
        let err = parse_lead_args(&args(&["xyzzy=1"])).unwrap_err();
        assert!(matches!(err, FieldParseError::UnknownFieldToken { .. }));
    }
}
