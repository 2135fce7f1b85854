use thiserror::Error;

/// Structural problems found while scanning wikitext.
///
/// This is the only exceptional outcome of the engine: a page that fails to
/// scan is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// A `{{` opened at `offset` never reached brace depth zero.
    #[error("unterminated template {{{{{name}...}}}} at byte {offset}")]
    Unterminated { name: String, offset: usize },
}

/// Authentication or session failure reported by the wiki.
///
/// Carried inside `anyhow::Error`; batch runners downcast to it to stop the
/// remaining pages instead of counting a per-page error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("authentication failed: {reason}")]
pub struct AuthError {
    pub reason: String,
}

impl AuthError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// MediaWiki error codes that mean the session cannot continue.
pub fn is_auth_error_code(code: &str) -> bool {
    matches!(
        code,
        "badtoken"
            | "notloggedin"
            | "assertuserfailed"
            | "assertbotfailed"
            | "mustbeloggedin"
            | "readapidenied"
            | "writeapidenied"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unterminated_message_names_template_and_offset() {
        let error = ScanError::Unterminated {
            name: "Kaynaksız".to_string(),
            offset: 12,
        };
        assert_eq!(
            error.to_string(),
            "unterminated template {{Kaynaksız...}} at byte 12"
        );
    }

    #[test]
    fn auth_error_survives_anyhow_round_trip() {
        let error = anyhow::Error::new(AuthError::new("badtoken"));
        let auth = error.downcast_ref::<AuthError>().expect("auth error");
        assert_eq!(auth.reason, "badtoken");
    }

    #[test]
    fn auth_codes_are_recognized() {
        assert!(is_auth_error_code("badtoken"));
        assert!(is_auth_error_code("assertbotfailed"));
        assert!(!is_auth_error_code("editconflict"));
    }
}
