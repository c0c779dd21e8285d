use super::{AuthError, UserId};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// The `sub` claim. Current issuers emit string ids; numeric ids are accepted
/// and used in their decimal form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Text(String),
    Number(i64),
}

impl Subject {
    fn into_user_id(self) -> Option<UserId> {
        match self {
            Subject::Text(s) if s.trim().is_empty() => None,
            Subject::Text(s) => Some(UserId::new(s)),
            Subject::Number(n) => Some(UserId::new(n.to_string())),
        }
    }
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token, the user's identifier.
    pub sub: Subject,
    /// Issued-at timestamp (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Verifies HS256 tokens against the shared secret.
///
/// Verification is a pure function of the token, the secret and the current
/// time. There is no clock-skew allowance: a token is refused the second its
/// `exp` has passed.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        // `sub` presence is enforced by `Claims` itself, which also admits numeric subjects.
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Checks the signature, then the expiry, then extracts the subject.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|e| {
            let err = classify(e.kind());
            log::debug!("Token rejected ({}): {}", err.kind(), e);
            err
        })?;

        data.claims
            .sub
            .into_user_id()
            .ok_or(AuthError::MalformedCredential)
    }
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::MalformedCredential,
    }
}

/// Mints tokens in the format the external auth service issues.
///
/// The API itself never issues tokens; this exists for tests and local
/// development against a shared secret.
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issues a token for `user_id` valid for the configured lifetime.
    pub fn issue(&self, user_id: &UserId) -> Result<String, jsonwebtoken::errors::Error> {
        self.issue_expiring_at(user_id, Utc::now() + self.ttl)
    }

    /// Issues a token for `user_id` with an explicit expiry, which may lie in the past.
    pub fn issue_expiring_at(
        &self,
        user_id: &UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: Subject::Text(user_id.as_str().to_owned()),
            iat: Some(Utc::now().timestamp()),
            exp: expires_at.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "test_secret_for_verifier";

    fn sign(payload: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        (Utc::now() + Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_token_generation_and_verification() {
        let issuer = TokenIssuer::new(SECRET, Duration::hours(24));
        let verifier = TokenVerifier::new(SECRET);

        let token = issuer.issue(&UserId::new("user-1")).unwrap();
        assert_eq!(verifier.verify(&token).unwrap(), UserId::new("user-1"));
    }

    #[test]
    fn test_numeric_subject_is_accepted() {
        let token = sign(json!({ "sub": 7, "exp": future_exp() }), SECRET);
        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token).unwrap(),
            UserId::new("7")
        );
    }

    #[test]
    fn test_token_expiration() {
        let issuer = TokenIssuer::new(SECRET, Duration::hours(24));
        let expired = issuer
            .issue_expiring_at(&UserId::new("user-2"), Utc::now() - Duration::seconds(5))
            .unwrap();

        assert_eq!(
            TokenVerifier::new(SECRET).verify(&expired),
            Err(AuthError::Expired)
        );
    }

    #[test]
    fn test_invalid_token_signature() {
        let token = TokenIssuer::new("a_completely_different_secret", Duration::hours(1))
            .issue(&UserId::new("user-3"))
            .unwrap();

        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_bad_signature_wins_over_expiry() {
        let token = TokenIssuer::new("other", Duration::hours(1))
            .issue_expiring_at(&UserId::new("user-3"), Utc::now() - Duration::hours(1))
            .unwrap();

        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let token = TokenIssuer::new(SECRET, Duration::hours(1))
            .issue(&UserId::new("alice"))
            .unwrap();
        let forged = sign(json!({ "sub": "mallory", "exp": future_exp() }), "guess");

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(
            TokenVerifier::new(SECRET).verify(&spliced),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_unsigned_token_is_rejected() {
        // {"alg":"none","typ":"JWT"}
        let header = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
        let token = format!("{}.eyJzdWIiOiJ4IiwiZXhwIjo0MTAyNDQ0ODAwfQ.", header);

        let err = TokenVerifier::new(SECRET).verify(&token).unwrap_err();
        assert_ne!(err, AuthError::Expired);
        assert!(matches!(
            err,
            AuthError::InvalidSignature | AuthError::MalformedCredential
        ));
    }

    #[test]
    fn test_malformed_tokens() {
        let verifier = TokenVerifier::new(SECRET);
        for token in ["", "not-a-jwt", "a.b", "a.b.c", "a.b.c.d", "%%%.%%%.%%%"] {
            assert_eq!(
                verifier.verify(token),
                Err(AuthError::MalformedCredential),
                "token {:?}",
                token
            );
        }
    }

    #[test]
    fn test_missing_or_empty_subject_is_malformed() {
        let verifier = TokenVerifier::new(SECRET);

        let no_sub = sign(json!({ "exp": future_exp() }), SECRET);
        assert_eq!(verifier.verify(&no_sub), Err(AuthError::MalformedCredential));

        let blank_sub = sign(json!({ "sub": "  ", "exp": future_exp() }), SECRET);
        assert_eq!(
            verifier.verify(&blank_sub),
            Err(AuthError::MalformedCredential)
        );
    }

    #[test]
    fn test_missing_expiry_is_malformed() {
        let token = sign(json!({ "sub": "user-4" }), SECRET);
        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token),
            Err(AuthError::MalformedCredential)
        );
    }

    #[test]
    fn test_audience_claim_is_ignored() {
        let token = sign(
            json!({ "sub": "user-5", "aud": "http://localhost:3000", "exp": future_exp() }),
            SECRET,
        );
        assert_eq!(
            TokenVerifier::new(SECRET).verify(&token).unwrap(),
            UserId::new("user-5")
        );
    }
}
