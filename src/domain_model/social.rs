use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SocialProvider {
    Naver,
    Google,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Naver => "NAVER",
            SocialProvider::Google => "GOOGLE",
        }
    }
}

impl fmt::Display for SocialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SocialProvider {
    type Err = SocialProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NAVER" => Ok(SocialProvider::Naver),
            "GOOGLE" => Ok(SocialProvider::Google),
            _ => Err(SocialProfileError::UnsupportedProvider(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum SocialProfileError {
    #[error("unsupported social provider: {0}")]
    UnsupportedProvider(String),
    #[error("{provider} payload is missing `{field}`")]
    MissingField {
        provider: SocialProvider,
        field: &'static str,
    },
}

/// Provider attributes normalized to what the user table needs.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SocialProfile {
    pub provider: SocialProvider,
    pub provider_id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

impl SocialProfile {
    pub fn parse(provider: SocialProvider, attributes: &Value) -> Result<Self, SocialProfileError> {
        match provider {
            SocialProvider::Naver => parse_naver(attributes),
            SocialProvider::Google => parse_google(attributes),
        }
    }

    /// Account name the profile is stored under, e.g. `GOOGLE_1093`.
    pub fn username(&self) -> String {
        format!("{}_{}", self.provider, self.provider_id)
    }
}

// Naver nests everything under `response`.
fn parse_naver(attributes: &Value) -> Result<SocialProfile, SocialProfileError> {
    let provider = SocialProvider::Naver;
    let response = attributes
        .get("response")
        .ok_or(SocialProfileError::MissingField {
            provider,
            field: "response",
        })?;
    Ok(SocialProfile {
        provider,
        provider_id: required_id(provider, response, "id")?,
        email: optional_str(response, "email"),
        nickname: optional_str(response, "nickname"),
    })
}

fn parse_google(attributes: &Value) -> Result<SocialProfile, SocialProfileError> {
    let provider = SocialProvider::Google;
    Ok(SocialProfile {
        provider,
        provider_id: required_id(provider, attributes, "sub")?,
        email: optional_str(attributes, "email"),
        nickname: optional_str(attributes, "name"),
    })
}

fn required_id(
    provider: SocialProvider,
    value: &Value,
    field: &'static str,
) -> Result<String, SocialProfileError> {
    match value.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(SocialProfileError::MissingField { provider, field }),
    }
}

fn optional_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn naver_profile_is_read_from_response() {
        let attributes = json!({
            "resultcode": "00",
            "response": { "id": "abc123", "email": "a@b.kr", "nickname": "kim" }
        });
        let profile = SocialProfile::parse(SocialProvider::Naver, &attributes).unwrap();
        assert_eq!(profile.username(), "NAVER_abc123");
        assert_eq!(profile.email.as_deref(), Some("a@b.kr"));
        assert_eq!(profile.nickname.as_deref(), Some("kim"));
    }

    #[test]
    fn google_profile_is_flat() {
        let attributes = json!({ "sub": "1093", "email": "x@gmail.com", "name": "Lee" });
        let profile = SocialProfile::parse(SocialProvider::Google, &attributes).unwrap();
        assert_eq!(profile.username(), "GOOGLE_1093");
        assert_eq!(profile.nickname.as_deref(), Some("Lee"));
    }

    #[test]
    fn missing_id_is_rejected() {
        let err = SocialProfile::parse(SocialProvider::Google, &json!({ "email": "x" }))
            .unwrap_err();
        assert_eq!(
            err,
            SocialProfileError::MissingField {
                provider: SocialProvider::Google,
                field: "sub"
            }
        );
        assert!(SocialProfile::parse(SocialProvider::Naver, &json!({ "id": "1" })).is_err());
    }

    #[test]
    fn provider_names_are_case_insensitive() {
        assert_eq!("naver".parse::<SocialProvider>(), Ok(SocialProvider::Naver));
        assert!("kakao".parse::<SocialProvider>().is_err());
    }
}
