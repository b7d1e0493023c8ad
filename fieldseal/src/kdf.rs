//! Sub-key derivation using HKDF (HMAC-based Key Derivation Function).
//!
//! The deployment configures exactly one key. Anything else that needs key
//! material, such as the blind index pepper, derives it from that key with
//! HKDF-SHA256 and a purpose-specific `info` label, so the field key itself
//! is only ever used for field encryption.

use crate::error::Error;
use crate::key::Key;
use hkdf::Hkdf;
use secrecy::SecretVec;
use sha2::Sha256;

/// Derived sub-key size in bytes (256 bits).
pub const SUBKEY_SIZE: usize = 32;

/// `info` label for the blind index pepper.
pub const BLIND_INDEX_INFO: &[u8] = b"fieldseal blind index v1";

/// Derives a purpose-bound sub-key from the field key.
///
/// # Errors
///
/// Returns `Error::IndexGenerationFailed` if HKDF rejects the output length,
/// which cannot happen for [`SUBKEY_SIZE`].
///
/// # Example
///
/// ```
/// use fieldseal::kdf::{derive_subkey, BLIND_INDEX_INFO};
/// use fieldseal::key::Key;
///
/// let key = Key::generate();
/// let pepper = derive_subkey(&key, BLIND_INDEX_INFO).expect("derivation failed");
/// ```
pub fn derive_subkey(key: &Key, info: &[u8]) -> Result<SecretVec<u8>, Error> {
    let hkdf = Hkdf::<Sha256>::new(None, key.expose());

    let mut subkey = vec![0u8; SUBKEY_SIZE];
    hkdf.expand(info, &mut subkey)
        .map_err(|e| Error::IndexGenerationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(SecretVec::new(subkey))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_derive_subkey_deterministic() {
        let key = Key::from_bytes(&[1u8; 32]).unwrap();

        let a = derive_subkey(&key, BLIND_INDEX_INFO).unwrap();
        let b = derive_subkey(&key, BLIND_INDEX_INFO).unwrap();

        assert_eq!(a.expose_secret(), b.expose_secret());
        assert_eq!(a.expose_secret().len(), SUBKEY_SIZE);
    }

    #[test]
    fn test_derive_subkey_differs_from_key() {
        let key = Key::from_bytes(&[1u8; 32]).unwrap();
        let subkey = derive_subkey(&key, BLIND_INDEX_INFO).unwrap();

        assert_ne!(subkey.expose_secret().as_slice(), key.expose().as_slice());
    }

    #[test]
    fn test_derive_subkey_different_labels() {
        let key = Key::from_bytes(&[1u8; 32]).unwrap();

        let a = derive_subkey(&key, b"purpose a").unwrap();
        let b = derive_subkey(&key, b"purpose b").unwrap();

        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_derive_subkey_different_keys() {
        let key1 = Key::from_bytes(&[1u8; 32]).unwrap();
        let key2 = Key::from_bytes(&[2u8; 32]).unwrap();

        let a = derive_subkey(&key1, BLIND_INDEX_INFO).unwrap();
        let b = derive_subkey(&key2, BLIND_INDEX_INFO).unwrap();

        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_blind_index_subkey_known_answer() {
        let key = Key::from_bytes(&[1u8; 32]).unwrap();
        let subkey = derive_subkey(&key, BLIND_INDEX_INFO).unwrap();

        assert_eq!(
            hex::encode(subkey.expose_secret()),
            "6df8ea7806dfeeabf0997770d40c9888542b648684f9c74041d84b1d2474a731"
        );
    }
}
