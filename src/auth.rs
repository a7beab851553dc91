/// Bearer token for the DevOps service API.
///
/// Wrapped in a newtype so the raw value never ends up in logs or debug
/// output by accident.
#[derive(Clone)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_raw_value() {
        let token = Token::from("secret-token");
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn debug_redacts_value() {
        let token = Token::from("secret-token");
        assert_eq!(format!("{token:?}"), "Token(***)");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
