//! Property-name grammar.
//!
//! A valid property name is one or more dot-separated segments, each
//! starting with a letter or underscore and continuing with letters, digits
//! or underscores. Schema construction rejects anything else.

use thiserror::Error;

/// Why a property name fails the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("property name is empty")]
    Empty,

    #[error("property name `{name}` has an empty segment")]
    EmptySegment { name: String },

    #[error("segment `{segment}` must start with a letter or underscore")]
    BadSegmentStart { segment: String },

    #[error("segment `{segment}` contains invalid character `{ch}`")]
    BadCharacter { segment: String, ch: char },
}

/// Checks `name` against the property-name grammar.
pub fn validate_property_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    for segment in name.split('.') {
        if segment.is_empty() {
            return Err(NameError::EmptySegment {
                name: name.to_string(),
            });
        }
        validate_segment(segment)?;
    }
    Ok(())
}

/// Returns whether `name` satisfies the property-name grammar.
pub fn is_valid_property_name(name: &str) -> bool {
    validate_property_name(name).is_ok()
}

fn validate_segment(segment: &str) -> Result<(), NameError> {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => {
            return Err(NameError::BadSegmentStart {
                segment: segment.to_string(),
            })
        }
    }
    for c in chars {
        if !c.is_alphanumeric() && c != '_' {
            return Err(NameError::BadCharacter {
                segment: segment.to_string(),
                ch: c,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_property_names() {
        let valid = [
            "name",
            "Name",
            "_private",
            "a1",
            "Outer.Inner",
            "a.b.c",
            "snake_case_99",
        ];
        for name in valid {
            assert!(
                is_valid_property_name(name),
                "should accept valid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_invalid_property_names() {
        let invalid = [
            "", ".", "a.", ".a", "a..b", "1abc", "a.1b", "a-b", "a b", "a.b-",
        ];
        for name in invalid {
            assert!(
                !is_valid_property_name(name),
                "should reject invalid name: {}",
                name
            );
        }
    }

    #[test]
    fn test_validation_names_the_failure() {
        assert_eq!(validate_property_name(""), Err(NameError::Empty));
        assert_eq!(
            validate_property_name("a..b"),
            Err(NameError::EmptySegment {
                name: "a..b".to_string()
            })
        );
        assert_eq!(
            validate_property_name("a.1b"),
            Err(NameError::BadSegmentStart {
                segment: "1b".to_string()
            })
        );
        assert_eq!(
            validate_property_name("a-b"),
            Err(NameError::BadCharacter {
                segment: "a-b".to_string(),
                ch: '-'
            })
        );
        assert!(validate_property_name("Outer.Inner").is_ok());
    }
}
