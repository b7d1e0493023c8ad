//! Record directory: the persistence boundary around the codec.
//!
//! The directory encrypts every field before it reaches a [`RecordStore`]
//! and decrypts on the way out. Stores only ever see [`SealedRecord`]s; no
//! plaintext shadow column exists for any encrypted field.

use crate::blind_index::BlindIndexer;
use crate::blob::EncryptedBlob;
use crate::codec::FieldCodec;
use crate::context::{EncryptionContext, IndexContext};
use crate::error::{DecryptError, Error};
use crate::resolver::IdentityResolver;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Column name of the identity field.
pub const IDENTITY_COLUMN: &str = "email";

/// A row as persisted: every value encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    /// Encrypted identity.
    pub identity: EncryptedBlob,
    /// Blind index of the normalized identity.
    pub identity_index: Vec<u8>,
    /// Encrypted fields by column name.
    pub fields: BTreeMap<String, EncryptedBlob>,
}

/// A row after decryption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlainRecord {
    /// Identity as registered.
    pub identity: String,
    /// Field values by column name.
    pub fields: BTreeMap<String, String>,
}

/// Storage collaborator: insert, fetch all, fetch by primary key.
pub trait RecordStore: Send + Sync {
    /// Inserts a record and returns its new primary key.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on storage failure.
    fn insert(&self, record: SealedRecord) -> Result<u64, Error>;

    /// Returns every record in primary key order.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on storage failure.
    fn all(&self) -> Result<Vec<(u64, SealedRecord)>, Error>;

    /// Returns one record, or `None` if the key is unknown.
    ///
    /// # Errors
    ///
    /// Returns `Error::Store` on storage failure.
    fn get(&self, id: u64) -> Result<Option<SealedRecord>, Error>;
}

#[derive(Debug, Default)]
struct MemoryRows {
    last_id: u64,
    rows: BTreeMap<u64, SealedRecord>,
}

/// In-memory [`RecordStore`] with auto-increment keys starting at 1.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryRows>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a stored record, for simulating corruption at rest.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `id` is unknown.
    pub fn replace(&self, id: u64, record: SealedRecord) -> Result<(), Error> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let slot = inner.rows.get_mut(&id).ok_or(Error::NotFound)?;
        *slot = record;
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::Store("memory store lock poisoned".to_string())
}

impl RecordStore for MemoryStore {
    fn insert(&self, record: SealedRecord) -> Result<u64, Error> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(id, record);
        Ok(id)
    }

    fn all(&self) -> Result<Vec<(u64, SealedRecord)>, Error> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.iter().map(|(id, record)| (*id, record.clone())).collect())
    }

    fn get(&self, id: u64) -> Result<Option<SealedRecord>, Error> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        Ok(inner.rows.get(&id).cloned())
    }
}

/// Registers, finds and reads PII records for one table.
///
/// # Example
///
/// ```
/// use fieldseal::codec::{CipherMode, FieldCodec};
/// use fieldseal::directory::{Directory, MemoryStore};
/// use fieldseal::key::Key;
///
/// let codec = FieldCodec::new(Key::generate(), CipherMode::default());
/// let directory = Directory::new(codec, MemoryStore::new(), "patients").unwrap();
///
/// let id = directory.register("alice@example.com", &[("diagnosis", "asthma")]).unwrap();
/// assert_eq!(directory.login(" ALICE@example.com").unwrap(), id);
/// assert_eq!(directory.read(id).unwrap().fields["diagnosis"], "asthma");
/// ```
#[derive(Debug)]
pub struct Directory<S: RecordStore> {
    codec: FieldCodec,
    indexer: BlindIndexer,
    store: S,
    table: String,
}

impl<S: RecordStore> Directory<S> {
    /// Creates a directory for `table` backed by `store`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexGenerationFailed` if the blind index pepper cannot
    /// be derived.
    pub fn new(codec: FieldCodec, store: S, table: impl Into<String>) -> Result<Self, Error> {
        let indexer = BlindIndexer::new(codec.key())?;
        Ok(Self { codec, indexer, store, table: table.into() })
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn context(&self, column: &str) -> EncryptionContext {
        EncryptionContext::new(self.table.as_str(), column)
    }

    /// Encrypts and stores a new record.
    ///
    /// Empty field values are encrypted like any other value, so stored rows
    /// never reveal which fields were left blank.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` or the store's error.
    pub fn register(&self, identity: &str, fields: &[(&str, &str)]) -> Result<u64, Error> {
        let identity_context = self.context(IDENTITY_COLUMN);
        let identity_index =
            self.indexer.index(identity, &IndexContext::from(&identity_context))?;

        let record = SealedRecord {
            identity: self.codec.encrypt_in(identity.trim(), &identity_context)?,
            identity_index,
            fields: fields
                .iter()
                .map(|(column, value)| {
                    let blob = self.codec.encrypt_in(value, &self.context(column))?;
                    Ok::<_, Error>(((*column).to_string(), blob))
                })
                .collect::<Result<_, Error>>()?,
        };

        let id = self.store.insert(record)?;
        tracing::info!(table = %self.table, record = id, "registered record");
        Ok(id)
    }

    /// Finds a record id by identity with a full decrypt-and-compare scan.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when nothing matches, including when no
    /// candidate could be decrypted.
    pub fn login(&self, identity: &str) -> Result<u64, Error> {
        let rows = self.store.all()?;
        IdentityResolver::new(&self.codec)
            .with_context(self.context(IDENTITY_COLUMN))
            .find_by_identity(identity, rows.iter().map(|(id, record)| (*id, &record.identity)))
            .ok_or(Error::NotFound)
    }

    /// Finds a record id by identity through the stored blind index.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` when nothing matches.
    pub fn lookup_indexed(&self, identity: &str) -> Result<u64, Error> {
        let identity_context = self.context(IDENTITY_COLUMN);
        let index_context = IndexContext::from(&identity_context);
        let rows = self.store.all()?;

        IdentityResolver::new(&self.codec)
            .with_context(identity_context)
            .find_by_blind_index(
                identity,
                &self.indexer,
                &index_context,
                rows.iter().map(|(id, record)| (*id, &record.identity_index, &record.identity)),
            )?
            .ok_or(Error::NotFound)
    }

    /// Reads and decrypts one record.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown id and `Error::Unreadable`
    /// if any field fails to decrypt. The cause is logged, not returned.
    pub fn read(&self, id: u64) -> Result<PlainRecord, Error> {
        let record = self.store.get(id)?.ok_or(Error::NotFound)?;

        let identity = self
            .codec
            .decrypt_in(record.identity.as_bytes(), &self.context(IDENTITY_COLUMN))
            .map_err(|err| self.unreadable(id, IDENTITY_COLUMN, err))?;

        let fields = record
            .fields
            .iter()
            .map(|(column, blob)| {
                self.codec
                    .decrypt_in(blob.as_bytes(), &self.context(column))
                    .map(|value| (column.clone(), value))
                    .map_err(|err| self.unreadable(id, column, err))
            })
            .collect::<Result<_, _>>()?;

        Ok(PlainRecord { identity, fields })
    }

    fn unreadable(&self, id: u64, column: &str, err: DecryptError) -> Error {
        tracing::warn!(table = %self.table, record = id, column, error = %err, "record unreadable");
        Error::Unreadable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CipherMode;
    use crate::key::Key;

    fn test_directory() -> Directory<MemoryStore> {
        let codec =
            FieldCodec::new(Key::from_bytes(&[42u8; 32]).unwrap(), CipherMode::default());
        Directory::new(codec, MemoryStore::new(), "patients").unwrap()
    }

    fn register_patients(directory: &Directory<MemoryStore>) -> (u64, u64) {
        let alice = directory
            .register(
                "alice@example.com",
                &[("phone_number", "555-0100"), ("ssn", ""), ("diagnosis", "asthma")],
            )
            .unwrap();
        let bob = directory
            .register("Bob@Example.com", &[("phone_number", "555-0199"), ("card", "4111")])
            .unwrap();
        (alice, bob)
    }

    #[test]
    fn test_register_assigns_sequential_ids() {
        let directory = test_directory();
        assert_eq!(register_patients(&directory), (1, 2));
    }

    #[test]
    fn test_stored_record_has_no_plaintext() {
        let directory = test_directory();
        let (alice, _) = register_patients(&directory);

        let record = directory.store().get(alice).unwrap().unwrap();
        let needle = b"alice@example.com";
        assert!(!record.identity.as_bytes().windows(needle.len()).any(|w| w == needle));
        assert_eq!(record.fields.len(), 3);
    }

    #[test]
    fn test_login_is_case_insensitive() {
        let directory = test_directory();
        let (alice, bob) = register_patients(&directory);

        assert_eq!(directory.login("ALICE@example.com").unwrap(), alice);
        assert_eq!(directory.login(" bob@example.com ").unwrap(), bob);
    }

    #[test]
    fn test_login_miss_is_not_found() {
        let directory = test_directory();
        register_patients(&directory);

        assert!(matches!(directory.login("nobody@example.com"), Err(Error::NotFound)));
    }

    #[test]
    fn test_lookup_indexed_matches_scan() {
        let directory = test_directory();
        let (alice, bob) = register_patients(&directory);

        assert_eq!(directory.lookup_indexed("alice@EXAMPLE.com").unwrap(), alice);
        assert_eq!(directory.lookup_indexed("bob@example.com").unwrap(), bob);
        assert!(matches!(directory.lookup_indexed("carol@example.com"), Err(Error::NotFound)));
    }

    #[test]
    fn test_read_round_trip_keeps_empty_fields() {
        let directory = test_directory();
        let (alice, _) = register_patients(&directory);

        let record = directory.read(alice).unwrap();
        assert_eq!(record.identity, "alice@example.com");
        assert_eq!(record.fields["phone_number"], "555-0100");
        assert_eq!(record.fields["ssn"], "");
        assert_eq!(record.fields["diagnosis"], "asthma");
    }

    #[test]
    fn test_read_unknown_id_is_not_found() {
        let directory = test_directory();
        assert!(matches!(directory.read(99), Err(Error::NotFound)));
    }

    #[test]
    fn test_swapped_columns_are_unreadable() {
        let directory = test_directory();
        let (alice, _) = register_patients(&directory);

        let mut record = directory.store().get(alice).unwrap().unwrap();
        let phone = record.fields["phone_number"].clone();
        record.fields.insert("diagnosis".to_string(), phone);
        directory.store().replace(alice, record).unwrap();

        assert!(matches!(directory.read(alice), Err(Error::Unreadable)));
    }

    #[test]
    fn test_corrupt_row_does_not_block_login() {
        let directory = test_directory();
        let (alice, bob) = register_patients(&directory);

        let mut record = directory.store().get(alice).unwrap().unwrap();
        let mut bytes = record.identity.clone().into_bytes();
        bytes[0] ^= 0xFF;
        record.identity = EncryptedBlob::from(bytes);
        directory.store().replace(alice, record).unwrap();

        assert_eq!(directory.login("bob@example.com").unwrap(), bob);
        assert!(matches!(directory.login("alice@example.com"), Err(Error::NotFound)));
        assert!(matches!(directory.read(alice), Err(Error::Unreadable)));
    }

    #[test]
    fn test_other_key_sees_nothing() {
        let directory = test_directory();
        register_patients(&directory);
        let rows = directory.store().all().unwrap();

        let other_codec =
            FieldCodec::new(Key::from_bytes(&[1u8; 32]).unwrap(), CipherMode::default());
        let other = Directory::new(other_codec, MemoryStore::new(), "patients").unwrap();
        for (_, record) in rows {
            other.store().insert(record).unwrap();
        }

        assert!(matches!(other.login("alice@example.com"), Err(Error::NotFound)));
        assert!(matches!(other.read(1), Err(Error::Unreadable)));
    }
}
