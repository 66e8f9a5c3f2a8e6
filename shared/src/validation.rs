//! Validation utilities for farm records

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use validator::ValidationErrors;

/// Validation failure for a single record
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    #[error("{field}: {message}")]
    Invalid { field: String, message: String },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl RecordError {
    /// Name of the offending field
    pub fn field(&self) -> &str {
        match self {
            RecordError::Required { field }
            | RecordError::Negative { field }
            | RecordError::Invalid { field, .. } => field,
            RecordError::InvalidRange { .. } => "dateRange",
        }
    }

    /// Japanese message for end users
    pub fn message_ja(&self) -> String {
        match self {
            RecordError::Required { field } => format!("{}は必須です", field),
            RecordError::Negative { field } => format!("{}に負の値は指定できません", field),
            RecordError::Invalid { field, message } => format!("{}が不正です: {}", field, message),
            RecordError::InvalidRange { start, end } => {
                format!("開始日 {} が終了日 {} より後になっています", start, end)
            }
        }
    }
}

/// Require a non-blank text value
pub fn require_text(field: &str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Require a non-negative quantity
pub fn require_non_negative(field: &str, value: Decimal) -> Result<(), RecordError> {
    if value < Decimal::ZERO {
        return Err(RecordError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Same as [`require_non_negative`] for optional quantities
pub fn require_non_negative_opt(field: &str, value: Option<Decimal>) -> Result<(), RecordError> {
    value.map_or(Ok(()), |v| require_non_negative(field, v))
}

/// Field-scoped activity must name its field by id or by name
pub fn require_field_reference(
    field_id: Option<uuid::Uuid>,
    field_name: Option<&str>,
) -> Result<(), RecordError> {
    let has_name = field_name.is_some_and(|n| !n.trim().is_empty());
    if field_id.is_none() && !has_name {
        return Err(RecordError::Required {
            field: "fieldName".to_string(),
        });
    }
    Ok(())
}

/// Convert derive-based validation output into the first (alphabetical) error
pub fn first_validation_error(errors: ValidationErrors) -> RecordError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| *name);

    match fields.first() {
        Some((name, errs)) => {
            let field = to_camel_case(name);
            match errs.first() {
                Some(err) if err.code == "length" => RecordError::Required { field },
                Some(err) => RecordError::Invalid {
                    field,
                    message: err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| err.code.to_string()),
                },
                None => RecordError::Invalid {
                    field,
                    message: "invalid".to_string(),
                },
            }
        }
        None => RecordError::Invalid {
            field: "record".to_string(),
            message: errors.to_string(),
        },
    }
}

fn to_camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text_rejects_blank() {
        assert!(require_text("name", "  ").is_err());
        assert!(require_text("name", "圃場A").is_ok());
    }

    #[test]
    fn test_require_non_negative() {
        assert!(require_non_negative("quantity", Decimal::from(-1)).is_err());
        assert!(require_non_negative("quantity", Decimal::ZERO).is_ok());
        assert!(require_non_negative_opt("amount", None).is_ok());
    }

    #[test]
    fn test_field_reference() {
        assert!(require_field_reference(None, None).is_err());
        assert!(require_field_reference(None, Some(" ")).is_err());
        assert!(require_field_reference(None, Some("A")).is_ok());
        assert!(require_field_reference(Some(uuid::Uuid::new_v4()), None).is_ok());
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("visitor_name"), "visitorName");
        assert_eq!(to_camel_case("name"), "name");
    }

    #[test]
    fn test_japanese_message() {
        let err = RecordError::Required {
            field: "訪問者名".to_string(),
        };
        assert_eq!(err.message_ja(), "訪問者名は必須です");
    }
}
