//! PASETO v4.local tokens: the JSON-encoded [`Payload`] is encrypted with
//! XChaCha20 and authenticated with BLAKE2b under one 32-byte key.

use chrono::Duration;
use pasetors::Local;
use pasetors::keys::SymmetricKey;
use pasetors::token::UntrustedToken;
use pasetors::version4::{LocalToken, V4};

use super::{Maker, Payload, TokenError};

pub const KEY_SIZE: usize = 32;

pub struct PasetoMaker {
    key: SymmetricKey<V4>,
}

impl PasetoMaker {
    pub fn new(symmetric_key: &str) -> Result<Self, TokenError> {
        let invalid_length = || TokenError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: symmetric_key.len(),
        };
        if symmetric_key.len() != KEY_SIZE {
            return Err(invalid_length());
        }
        let key = SymmetricKey::<V4>::from(symmetric_key.as_bytes()).map_err(|_| invalid_length())?;
        Ok(Self { key })
    }
}

impl Maker for PasetoMaker {
    fn create_token(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<(String, Payload), TokenError> {
        let payload = Payload::new(username, duration);
        let message =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Signing(e.to_string()))?;
        let token = LocalToken::encrypt(&self.key, &message, None, None)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok((token, payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let untrusted =
            UntrustedToken::<Local, V4>::try_from(token).map_err(|_| TokenError::Invalid)?;
        let trusted = LocalToken::decrypt(&self.key, &untrusted, None, None)
            .map_err(|_| TokenError::Invalid)?;
        let payload: Payload =
            serde_json::from_str(trusted.payload()).map_err(|_| TokenError::Invalid)?;

        payload.valid()?;
        Ok(payload)
    }
}
