use std::collections::HashSet;

use anyhow::Context;
use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenKind};
use crate::{config::JwtConfig, state::AppState};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Signing and verification keys plus token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub access_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
            reset_ttl_hours,
        } = &state.config.jwt;
        Self::new(
            secret,
            Duration::minutes(*ttl_minutes),
            Duration::hours(*reset_ttl_hours),
        )
    }
}

impl JwtKeys {
    pub fn new(secret: &str, access_ttl: Duration, reset_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            reset_ttl,
        }
    }

    pub fn sign(&self, subject: &str, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        self.sign_at(subject, kind, ttl, OffsetDateTime::now_utc())
    }

    pub fn sign_at(
        &self,
        subject: &str,
        kind: TokenKind,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let exp = now.checked_add(ttl).context("token ttl out of range")?;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            kind,
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign(&user_id.to_string(), TokenKind::Access, self.access_ttl)
    }

    pub fn sign_password_reset(&self, email: &str) -> anyhow::Result<String> {
        self.sign(email, TokenKind::PasswordReset, self.reset_ttl)
    }

    pub fn verify(&self, token: &str, kind: TokenKind) -> Option<Claims> {
        self.verify_at(token, kind, OffsetDateTime::now_utc())
    }

    /// Signature first, then expiry against `now`, then kind.
    /// Any failure is reported as `None`.
    pub fn verify_at(&self, token: &str, kind: TokenKind, now: OffsetDateTime) -> Option<Claims> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

        let claims = match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                debug!(error = %e, "jwt rejected");
                return None;
            }
        };
        if claims.exp <= now.unix_timestamp() {
            debug!("jwt expired");
            return None;
        }
        if claims.kind != kind {
            debug!(expected = ?kind, actual = ?claims.kind, "jwt kind mismatch");
            return None;
        }
        Some(claims)
    }

    pub fn verify_access(&self, token: &str) -> Option<Uuid> {
        let claims = self.verify(token, TokenKind::Access)?;
        Uuid::parse_str(&claims.sub).ok()
    }

    /// Returns the email the reset token was issued for.
    pub fn verify_password_reset(&self, token: &str) -> Option<String> {
        self.verify(token, TokenKind::PasswordReset).map(|c| c.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str) -> JwtKeys {
        JwtKeys::new(secret, Duration::minutes(60), Duration::hours(48))
    }

    #[test]
    fn sign_and_verify_access_token() {
        let keys = make_keys("dev-secret");
        let user_id = Uuid::new_v4();
        let token = keys.sign_access(user_id).expect("sign access");
        assert_eq!(keys.verify_access(&token), Some(user_id));
    }

    #[test]
    fn token_expires_when_clock_moves_forward() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        let token = keys
            .sign_at("user-u", TokenKind::Access, Duration::hours(1), now)
            .unwrap();

        let claims = keys.verify_at(&token, TokenKind::Access, now).expect("fresh token");
        assert_eq!(claims.sub, "user-u");
        assert!(keys
            .verify_at(&token, TokenKind::Access, now + Duration::hours(2))
            .is_none());
    }

    #[test]
    fn non_positive_ttl_is_already_invalid() {
        let keys = make_keys("dev-secret");
        let now = OffsetDateTime::now_utc();
        for ttl in [Duration::ZERO, Duration::seconds(-30)] {
            let token = keys.sign_at("u", TokenKind::Access, ttl, now).unwrap();
            assert!(keys.verify_at(&token, TokenKind::Access, now).is_none());
        }
    }

    #[test]
    fn oversized_ttl_is_an_error() {
        let keys = JwtKeys::new(
            "dev-secret",
            Duration::minutes(10_000_000_000),
            Duration::hours(48),
        );
        let err = keys.sign_access(Uuid::new_v4()).unwrap_err();
        assert!(err.to_string().contains("ttl out of range"));
    }

    #[test]
    fn tampering_any_byte_invalidates() {
        let keys = make_keys("dev-secret");
        let token = keys.sign_access(Uuid::new_v4()).unwrap();
        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();
            assert!(
                keys.verify(&tampered, TokenKind::Access).is_none(),
                "tampered byte {i} still verified"
            );
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = make_keys("secret-a").sign_access(Uuid::new_v4()).unwrap();
        assert!(make_keys("secret-b").verify_access(&token).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = make_keys("dev-secret");
        assert!(keys.verify_access("").is_none());
        assert!(keys.verify_access("not.a.token").is_none());
    }

    #[test]
    fn kinds_are_not_interchangeable() {
        let keys = make_keys("dev-secret");
        let reset = keys.sign_password_reset("a@x.com").unwrap();
        assert!(keys.verify_access(&reset).is_none());
        assert_eq!(keys.verify_password_reset(&reset).as_deref(), Some("a@x.com"));

        let access = keys.sign_access(Uuid::new_v4()).unwrap();
        assert!(keys.verify_password_reset(&access).is_none());
    }

    #[test]
    fn access_subject_must_be_uuid() {
        let keys = make_keys("dev-secret");
        let token = keys
            .sign("not-a-uuid", TokenKind::Access, Duration::minutes(5))
            .unwrap();
        assert!(keys.verify(&token, TokenKind::Access).is_some());
        assert!(keys.verify_access(&token).is_none());
    }
}
