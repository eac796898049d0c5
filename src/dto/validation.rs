//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player name, in characters.
pub const MAX_NAME_LENGTH: usize = 64;

/// Validates that a player name is not blank and fits [`MAX_NAME_LENGTH`] once trimmed.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    let length = trimmed.chars().count();
    if length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_NAME_LENGTH} characters (got {length})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a participant list holds at least one usable name and no overlong one.
///
/// Blank entries are tolerated; the session store drops them.
pub fn validate_participants(names: &[String]) -> Result<(), ValidationError> {
    if names.iter().all(|name| name.trim().is_empty()) {
        let mut err = ValidationError::new("participants_empty");
        err.message = Some("At least one participant name is required".into());
        return Err(err);
    }

    names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .try_for_each(|name| validate_player_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Alice").is_ok());
        assert!(validate_player_name("  Bob  ").is_ok());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name(&"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_participants() {
        assert!(validate_participants(&names(&["Alice", "  "])).is_ok());
        assert!(validate_participants(&names(&["", " "])).is_err());
        assert!(validate_participants(&[]).is_err());
    }
}
