use std::borrow::Cow;

use validator::ValidationError;

use crate::utils::slug::is_valid_slug;

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("blank", "must not be blank"));
    }
    Ok(())
}

/// Accepts `#RGB` and `#RRGGBB`.
pub fn validate_hex_code(value: &str) -> Result<(), ValidationError> {
    let valid = value
        .strip_prefix('#')
        .filter(|digits| digits.len() == 3 || digits.len() == 6)
        .is_some_and(|digits| digits.chars().all(|c| c.is_ascii_hexdigit()));

    if !valid {
        return Err(invalid("hex_code", "must look like #RGB or #RRGGBB"));
    }
    Ok(())
}

pub fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if !is_valid_slug(value) {
        return Err(invalid(
            "slug",
            "must be lower-case letters and digits separated by single dashes",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_codes() {
        assert!(validate_hex_code("#0f0").is_ok());
        assert!(validate_hex_code("#008080").is_ok());
        assert!(validate_hex_code("008080").is_err());
        assert!(validate_hex_code("#00808").is_err());
        assert!(validate_hex_code("#gggggg").is_err());
    }

    #[test]
    fn blank_strings() {
        assert!(validate_not_blank("  ").is_err());
        assert!(validate_not_blank("Teal").is_ok());
    }
}
