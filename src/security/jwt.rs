/// JWT validation for watch-service
///
/// Validation-only: this service never issues tokens; credential issuance
/// belongs to the platform's identity service. RS256 only, no symmetric
/// algorithms, so a leaked public key cannot be used to forge tokens.
///
/// The public key is loaded once at startup from `JWT_PUBLIC_KEY_PEM` (or a
/// file path in `JWT_PUBLIC_KEY_PATH`) and held immutable thereafter.
use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

static DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Claims carried by platform access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Read the validation key from the environment.
pub fn load_validation_key() -> Result<String> {
    if let Ok(pem) = std::env::var("JWT_PUBLIC_KEY_PEM") {
        return Ok(pem);
    }

    if let Ok(path) = std::env::var("JWT_PUBLIC_KEY_PATH") {
        return std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("failed to read JWT public key from {path}: {e}"));
    }

    Err(anyhow!(
        "JWT_PUBLIC_KEY_PEM or JWT_PUBLIC_KEY_PATH must be set"
    ))
}

/// Install the validation key. Must be called once during startup before any
/// token validation; repeated initialization is an error.
pub fn initialize_validation_key(public_key_pem: &str) -> Result<()> {
    let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("invalid RSA public key: {e}"))?;

    DECODING_KEY
        .set(key)
        .map_err(|_| anyhow!("JWT validation key already initialized"))
}

/// Validate a bearer token and return its claims.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let key = DECODING_KEY
        .get()
        .ok_or_else(|| anyhow!("JWT validation key not initialized"))?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, key, &validation).map_err(|e| anyhow!("token validation failed: {e}"))
}
