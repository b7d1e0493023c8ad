//! # `FieldSeal`
//!
//! Field-level encryption for PII columns, with identity lookup that works
//! without a plaintext index.
//!
//! ## Features
//!
//! - AEAD field encryption (ChaCha20-Poly1305, AES-256-GCM), fresh nonce per field
//! - Self-describing blobs: `nonce || ciphertext || tag`
//! - Decrypt-and-scan identity resolution tolerant of corrupt rows
//! - Optional blind indexes for constant-cost equality lookup
//! - Explicit key providers; ephemeral keys only on request
//!
//! ## Example
//!
//! ```rust,ignore
//! use fieldseal::prelude::*;
//!
//! let settings = Settings::from_env()?;
//! let codec = FieldCodec::from_settings(&settings)?;
//!
//! let blob = codec.encrypt("alice@example.com")?;
//! let rows = vec![(1, blob)];
//! assert_eq!(resolve_identity(&codec, "Alice@Example.com", rows), Some(1));
//! ```

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod blind_index;
pub mod blob;
pub mod codec;
pub mod context;
pub mod directory;
pub mod error;
pub mod kdf;
pub mod key;
pub mod key_provider;
pub mod resolver;
pub mod settings;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::blind_index::BlindIndexer;
    pub use crate::blob::EncryptedBlob;
    pub use crate::codec::{CipherMode, FieldCodec};
    pub use crate::context::{EncryptionContext, IndexContext};
    pub use crate::directory::{Directory, MemoryStore, PlainRecord, RecordStore, SealedRecord};
    pub use crate::error::{ConfigError, DecryptError, Error};
    pub use crate::key::Key;
    pub use crate::key_provider::{ConfiguredKeyProvider, DevModeKeyProvider, KeyProvider};
    pub use crate::resolver::{resolve_identity, IdentityResolver, Resolution};
    pub use crate::settings::Settings;
}
