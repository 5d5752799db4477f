//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dto::room::MediaReference;

/// Longest display name accepted from a joining client, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 40;
/// Longest room identifier accepted from clients.
pub const MAX_ROOM_ID_CHARS: usize = 32;

/// Validates that a display name is non-blank, reasonably short and free of control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Alice")       // Ok
/// validate_display_name("   ")         // Err - blank
/// validate_display_name("tab\there")   // Err - control character
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_blank");
        err.message = Some("Display name must not be blank".into());
        return Err(err);
    }

    let count = trimmed.chars().count();
    if count > MAX_DISPLAY_NAME_CHARS {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some(
            format!("Display name must be at most {MAX_DISPLAY_NAME_CHARS} characters (got {count})")
                .into(),
        );
        return Err(err);
    }

    if trimmed.chars().any(char::is_control) {
        let mut err = ValidationError::new("display_name_format");
        err.message = Some("Display name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a room identifier is a short run of ASCII alphanumerics.
pub fn validate_room_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ROOM_ID_CHARS {
        let mut err = ValidationError::new("room_id_length");
        err.message = Some(
            format!(
                "Room ID must be between 1 and {MAX_ROOM_ID_CHARS} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room ID must contain only ASCII letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a media reference points somewhere.
pub fn validate_media_reference(media: &MediaReference) -> Result<(), ValidationError> {
    match media {
        MediaReference::Local { filename } => {
            if filename.trim().is_empty() {
                return Err(ValidationError::new("media_filename_blank"));
            }
            if filename.contains(['/', '\\']) || filename.contains("..") {
                let mut err = ValidationError::new("media_filename_format");
                err.message = Some("Local media must be a bare filename".into());
                return Err(err);
            }
        }
        MediaReference::Remote { url } => {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                let mut err = ValidationError::new("media_url_scheme");
                err.message = Some("Remote media must be an http(s) URL".into());
                return Err(err);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Alice").is_ok());
        assert!(validate_display_name("  padded  ").is_ok());
        assert!(validate_display_name("ゆうき").is_ok());
    }

    #[test]
    fn test_validate_display_name_invalid() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
        assert!(validate_display_name(&"x".repeat(MAX_DISPLAY_NAME_CHARS + 1)).is_err());
        assert!(validate_display_name("tab\there").is_err());
    }

    #[test]
    fn test_validate_room_id() {
        assert!(validate_room_id("a1b2c3").is_ok());
        assert!(validate_room_id("").is_err());
        assert!(validate_room_id("abc-12").is_err());
        assert!(validate_room_id(&"a".repeat(MAX_ROOM_ID_CHARS + 1)).is_err());
    }

    #[test]
    fn test_validate_media_reference() {
        assert!(
            validate_media_reference(&MediaReference::Local {
                filename: "song.mp3".into()
            })
            .is_ok()
        );
        assert!(
            validate_media_reference(&MediaReference::Local {
                filename: "../etc/passwd".into()
            })
            .is_err()
        );
        assert!(
            validate_media_reference(&MediaReference::Remote {
                url: "https://cdn.example.com/a.m4a".into()
            })
            .is_ok()
        );
        assert!(
            validate_media_reference(&MediaReference::Remote {
                url: "ftp://example.com/a.mp3".into()
            })
            .is_err()
        );
    }
}
