use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Access and refresh tokens are signed with different keys so that one kind
/// can never be presented as the other.
#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_signing_key: Vec<u8>,
    pub refresh_signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessWireClaims {
    #[serde(rename = "userid")]
    user_id: UserId,
    #[serde(rename = "tokensecret")]
    secret: Secret,
    exp: i64,
    iss: String,
    aud: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshWireClaims {
    #[serde(rename = "userid")]
    user_id: UserId,
    #[serde(rename = "tokenid")]
    credential_id: RefreshCredentialId,
    #[serde(rename = "tokensecret")]
    secret: Secret,
    exp: i64,
    iss: String,
    aud: String,
}

pub struct JwtHs512Codec {
    cfg: JwtConfig,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl JwtHs512Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs512Codec {
            access_encoding: EncodingKey::from_secret(&cfg.access_signing_key),
            access_decoding: DecodingKey::from_secret(&cfg.access_signing_key),
            refresh_encoding: EncodingKey::from_secret(&cfg.refresh_signing_key),
            refresh_decoding: DecodingKey::from_secret(&cfg.refresh_signing_key),
            cfg,
        }
    }

    fn validation(&self) -> Validation {
        let mut v = Validation::new(Algorithm::HS512);
        // Expiry is checked by the validator against its own clock.
        v.validate_exp = false;
        v.set_audience(&[&self.cfg.audience]);
        v.set_issuer(&[&self.cfg.issuer]);
        v
    }

    #[inline]
    fn from_timestamp(exp: i64) -> Result<DateTime<Utc>, AuthError> {
        DateTime::from_timestamp(exp, 0).ok_or(AuthError::MalformedToken)
    }
}

impl TokenCodec for JwtHs512Codec {
    fn sign_access(&self, claims: &AccessClaims) -> Result<AccessToken, AuthError> {
        let wire = AccessWireClaims {
            user_id: claims.user_id,
            secret: claims.secret.clone(),
            exp: claims.expires_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS512), &wire, &self.access_encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(AccessToken(token))
    }

    fn sign_refresh(&self, claims: &RefreshClaims) -> Result<RefreshToken, AuthError> {
        let wire = RefreshWireClaims {
            user_id: claims.user_id,
            credential_id: claims.credential_id,
            secret: claims.secret.clone(),
            exp: claims.expires_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS512), &wire, &self.refresh_encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(RefreshToken(token))
    }

    fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let data = decode::<AccessWireClaims>(token, &self.access_decoding, &self.validation())
            .map_err(|_| AuthError::MalformedToken)?;
        let wire = data.claims;
        Ok(AccessClaims {
            user_id: wire.user_id,
            secret: wire.secret,
            expires_at: Self::from_timestamp(wire.exp)?,
        })
    }

    fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let data = decode::<RefreshWireClaims>(token, &self.refresh_decoding, &self.validation())
            .map_err(|_| AuthError::MalformedToken)?;
        let wire = data.claims;
        Ok(RefreshClaims {
            user_id: wire.user_id,
            credential_id: wire.credential_id,
            secret: wire.secret,
            expires_at: Self::from_timestamp(wire.exp)?,
        })
    }
}
