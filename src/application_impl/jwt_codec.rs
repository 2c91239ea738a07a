use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // identity as string
    role: Role,
    typ: TokenKind,
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
    jti: String, // keeps tokens minted in the same second distinct
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Codec {
    /// An empty key is a configuration error and is refused up front, so
    /// signing cannot fail later for lack of a key.
    pub fn new(cfg: JwtConfig) -> Result<Self, AuthError> {
        if cfg.signing_key.is_empty() {
            return Err(AuthError::InternalError(
                "jwt signing key is empty".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);

        Ok(JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
        })
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn encode_claims(
        &self,
        principal: Principal,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: principal.identity.to_string(),
            role: principal.role,
            typ: kind,
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: Self::gen_jti(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    fn issue(
        &self,
        principal: Principal,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(String, DateTime<Utc>), AuthError> {
        let ttl = TimeDelta::from_std(ttl).map_err(|e| AuthError::InternalError(e.to_string()))?;
        let iat = Utc::now();
        let exp = iat + ttl;
        let token = self.encode_claims(principal, kind, iat, exp)?;
        Ok((token, exp))
    }

    fn verify(&self, token: &str, kind: TokenKind) -> Result<VerifiedToken, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                _ => AuthError::MalformedToken,
            }
        })?;
        let claims = data.claims;
        if claims.typ != kind {
            return Err(AuthError::MalformedToken);
        }
        let identity = claims
            .sub
            .parse::<Identity>()
            .map_err(|_| AuthError::MalformedToken)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::MalformedToken)?;

        Ok(VerifiedToken {
            principal: Principal {
                identity,
                role: claims.role,
            },
            expires_at,
        })
    }

    #[cfg(test)]
    pub(crate) fn issue_expired_refresh(&self, principal: Principal) -> RefreshToken {
        let exp = Utc::now() - TimeDelta::minutes(5);
        let iat = exp - TimeDelta::hours(1);
        RefreshToken(
            self.encode_claims(principal, TokenKind::Refresh, iat, exp)
                .unwrap(),
        )
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue_access_token(
        &self,
        principal: Principal,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let (token, exp) = self.issue(principal, TokenKind::Access, self.cfg.access_ttl)?;
        Ok((AccessToken(token), exp))
    }

    fn issue_refresh_token(
        &self,
        principal: Principal,
    ) -> Result<(RefreshToken, DateTime<Utc>), AuthError> {
        let (token, exp) = self.issue(principal, TokenKind::Refresh, self.cfg.refresh_ttl)?;
        Ok((RefreshToken(token), exp))
    }

    fn verify_access_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    fn verify_refresh_token(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
pub(crate) fn test_codec() -> JwtHs256Codec {
    JwtHs256Codec::new(JwtConfig {
        issuer: "nearbuy.auth".to_string(),
        audience: "nearbuy-client".to_string(),
        access_ttl: Duration::from_secs(15 * 60),
        refresh_ttl: Duration::from_secs(7 * 24 * 60 * 60),
        signing_key: b"test-signing-key-0123456789abcdef".to_vec(),
    })
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Principal = Principal {
        identity: Identity(42),
        role: Role::User,
    };

    #[test]
    fn refresh_token_round_trips_identity_and_role() {
        let codec = test_codec();
        let (token, exp) = codec.issue_refresh_token(ALICE).unwrap();
        let verified = codec.verify_refresh_token(token.as_str()).unwrap();
        assert_eq!(verified.principal, ALICE);
        assert_eq!(verified.expires_at.timestamp(), exp.timestamp());
    }

    #[test]
    fn tokens_minted_back_to_back_differ() {
        let codec = test_codec();
        let (a, _) = codec.issue_refresh_token(ALICE).unwrap();
        let (b, _) = codec.issue_refresh_token(ALICE).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let codec = test_codec();
        let (access, _) = codec.issue_access_token(ALICE).unwrap();
        let (refresh, _) = codec.issue_refresh_token(ALICE).unwrap();
        assert!(matches!(
            codec.verify_refresh_token(&access.0),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(
            codec.verify_access_token(&refresh.0),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let codec = test_codec();
        let expired = codec.issue_expired_refresh(ALICE);
        assert!(matches!(
            codec.verify_refresh_token(expired.as_str()),
            Err(AuthError::ExpiredToken)
        ));
    }

    #[test]
    fn foreign_signature_is_malformed() {
        let codec = test_codec();
        let other = JwtHs256Codec::new(JwtConfig {
            signing_key: b"some-other-key".to_vec(),
            ..codec.cfg.clone()
        })
        .unwrap();
        let (token, _) = other.issue_refresh_token(ALICE).unwrap();
        assert!(matches!(
            codec.verify_refresh_token(token.as_str()),
            Err(AuthError::MalformedToken)
        ));
        assert!(matches!(
            codec.verify_refresh_token("not-a-jwt"),
            Err(AuthError::MalformedToken)
        ));
    }

    #[test]
    fn empty_key_is_refused() {
        let result = JwtHs256Codec::new(JwtConfig {
            signing_key: Vec::new(),
            ..test_codec().cfg.clone()
        });
        assert!(result.is_err());
    }
}
