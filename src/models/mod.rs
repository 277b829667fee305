// src/models/mod.rs

pub mod round;
pub mod score;
pub mod subject;

/// Validator for free-text fields that must contain something besides whitespace.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

/// Validator for player names: must still contain text once markup is stripped.
pub fn player_name(value: &str) -> Result<(), validator::ValidationError> {
    if crate::utils::html::clean_player_name(value).is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("must contain text besides markup and whitespace".into());
        return Err(err);
    }
    Ok(())
}
