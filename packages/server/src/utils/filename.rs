use thiserror::Error;

/// Longest accepted file or folder name, in characters.
pub const MAX_NAME_CHARS: usize = 255;

/// Why a user-supplied name was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,
    #[error("name exceeds {MAX_NAME_CHARS} characters")]
    TooLong,
    #[error("name must not contain path separators")]
    PathSeparator,
    #[error("name must not be '.' or '..'")]
    DotEntry,
    #[error("name must not contain control characters")]
    ControlCharacter,
}

/// Validate a flat file or folder name and return it trimmed.
///
/// Leading dots are allowed (`.env` is a valid upload); directory
/// components and control characters are not, since the name ends up in
/// `Content-Disposition` headers.
pub fn validate_name(name: &str) -> Result<&str, NameError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(NameError::Empty);
    }
    if trimmed.chars().count() > MAX_NAME_CHARS {
        return Err(NameError::TooLong);
    }
    if trimmed.chars().any(char::is_control) {
        return Err(NameError::ControlCharacter);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(NameError::PathSeparator);
    }
    if trimmed == "." || trimmed == ".." {
        return Err(NameError::DotEntry);
    }

    Ok(trimmed)
}

/// Build a safe `Content-Disposition` header value.
pub fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
