//! Legacy password transform expected by the remote backend.
//!
//! The backend stores and compares passwords in this form: each character is
//! XORed with a fixed key and the result is base64 encoded. It is a reversible
//! obfuscation with a public key, NOT encryption and NOT a hash. It gives no
//! confidentiality and must never be relied on as a security boundary; it is
//! here only so requests match what the backend already has on file.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const LEGACY_KEY: &[u8] = b"FOOD_AI_RESCUE_SECURE_KEY_2025";

/// Errors from the legacy transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The input has a character outside Latin-1, which the backend format
    /// cannot represent.
    UnsupportedCharacter(char),
    /// The stored value is not valid base64.
    InvalidEncoding,
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::UnsupportedCharacter(c) => {
                write!(f, "Character {:?} cannot be encoded for the backend", c)
            }
            CredentialError::InvalidEncoding => write!(f, "Value is not valid base64"),
        }
    }
}

impl std::error::Error for CredentialError {}

fn xor_with_key(bytes: &mut [u8]) {
    for (idx, byte) in bytes.iter_mut().enumerate() {
        *byte ^= LEGACY_KEY[idx % LEGACY_KEY.len()];
    }
}

/// Produces the backend's wire form of a password.
pub fn to_legacy_wire_form(password: &str) -> Result<String, CredentialError> {
    let mut bytes = password
        .chars()
        .map(|c| u8::try_from(u32::from(c)).map_err(|_| CredentialError::UnsupportedCharacter(c)))
        .collect::<Result<Vec<u8>, _>>()?;
    xor_with_key(&mut bytes);
    Ok(STANDARD.encode(bytes))
}

/// Reverses [`to_legacy_wire_form`].
pub fn from_legacy_wire_form(encoded: &str) -> Result<String, CredentialError> {
    let mut bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CredentialError::InvalidEncoding)?;
    xor_with_key(&mut bytes);
    Ok(bytes.into_iter().map(char::from).collect())
}
