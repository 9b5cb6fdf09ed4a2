use std::fmt;

/// Number of trailing characters `masked` leaves visible
const VISIBLE_SUFFIX: usize = 4;

/// An API key or token that must never reach logs or terminal output.
///
/// `Debug` and `Display` print `[REDACTED]`; [`SecretString::masked`] gives a
/// short hint for diagnostics. Surrounding whitespace (a common artefact of
/// pasting keys) is dropped on construction.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.len() == s.len() {
            Self(s)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The raw value, for building a request
    pub fn unsecure(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `****` followed by the last four characters, or only `****` for keys
    /// too short to reveal anything
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= VISIBLE_SUFFIX * 2 {
            return "****".to_string();
        }
        let suffix: String = self.0.chars().skip(count - VISIBLE_SUFFIX).collect();
        format!("****{}", suffix)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_formatting() {
        let secret = SecretString::new("AIza-not-really");
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert!(!format!("{:?}", secret).contains("AIza"));
        assert_eq!(secret.unsecure(), "AIza-not-really");
    }

    #[test]
    fn test_pasted_whitespace_is_trimmed() {
        let secret = SecretString::from(" AIzaKey\n".to_string());
        assert_eq!(secret.unsecure(), "AIzaKey");
        assert!(SecretString::new("   ").is_empty());
    }

    #[test]
    fn test_masked_hint() {
        assert_eq!(SecretString::new("AIzaSyExampleKey7f2c").masked(), "****7f2c");
        assert_eq!(SecretString::new("short").masked(), "****");
    }
}
