//! Identity lookup over encrypted identity columns.
//!
//! Field encryption is randomized, so an encrypted email column cannot carry
//! an equality index. Lookup is a linear scan: every candidate blob is
//! decrypted and compared against the normalized target.
//!
//! # Cost
//!
//! One AEAD decryption per candidate, so a lookup over `n` rows costs `n`
//! decryptions. This is the throughput ceiling of the design. Callers that
//! need bounded latency must cap the candidate set or wrap the call in their
//! own deadline. [`IdentityResolver::find_by_blind_index`] trades a stored
//! blind index for constant-cost filtering.

use crate::blind_index::BlindIndexer;
use crate::codec::FieldCodec;
use crate::context::{EncryptionContext, IndexContext};
use crate::error::{DecryptError, Error};
use zeroize::Zeroizing;

/// Normalizes an identity for comparison: trims surrounding whitespace and
/// lowercases.
#[must_use]
pub fn normalize_identity(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Outcome of an identity scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution<Id> {
    /// Id of the first matching candidate.
    pub id: Option<Id>,
    /// Candidates examined, including skipped ones.
    pub scanned: usize,
    /// Candidates whose blob failed to decrypt.
    pub skipped: usize,
}

/// Finds records by decrypting and comparing their identity blobs.
///
/// Candidates are visited in the order given. The first match wins; if
/// identities are duplicated, which one is returned is not a guarantee
/// callers may rely on. A candidate that fails to decrypt is skipped and the
/// scan continues, and a scan in which nothing decrypts reports "not found"
/// just like a scan with no match.
///
/// # Example
///
/// ```
/// use fieldseal::codec::{CipherMode, FieldCodec};
/// use fieldseal::key::Key;
/// use fieldseal::resolver::IdentityResolver;
///
/// let codec = FieldCodec::new(Key::generate(), CipherMode::default());
/// let rows = vec![
///     (1, codec.encrypt("a@x.com").unwrap()),
///     (2, codec.encrypt("B@X.com").unwrap()),
/// ];
///
/// let resolver = IdentityResolver::new(&codec);
/// assert_eq!(resolver.find_by_identity(" b@x.com ", rows), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct IdentityResolver<'a> {
    codec: &'a FieldCodec,
    context: Option<EncryptionContext>,
}

impl<'a> IdentityResolver<'a> {
    /// Creates a resolver for identities encrypted without a context.
    #[must_use]
    pub const fn new(codec: &'a FieldCodec) -> Self {
        Self { codec, context: None }
    }

    /// Decrypts candidates as fields bound to `context`.
    #[must_use]
    pub fn with_context(mut self, context: EncryptionContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Returns the id of the first candidate whose identity matches `target`.
    pub fn find_by_identity<Id, B, I>(&self, target: &str, candidates: I) -> Option<Id>
    where
        I: IntoIterator<Item = (Id, B)>,
        B: AsRef<[u8]>,
    {
        self.resolve(target, candidates).id
    }

    /// Like [`IdentityResolver::find_by_identity`], for columns that may be NULL.
    ///
    /// Absent blobs are passed over without counting as failures.
    pub fn find_by_optional_identity<Id, B, I>(&self, target: &str, candidates: I) -> Option<Id>
    where
        I: IntoIterator<Item = (Id, Option<B>)>,
        B: AsRef<[u8]>,
    {
        self.find_by_identity(
            target,
            candidates.into_iter().filter_map(|(id, blob)| blob.map(|blob| (id, blob))),
        )
    }

    /// Scans `candidates` and reports the match with scan statistics.
    pub fn resolve<Id, B, I>(&self, target: &str, candidates: I) -> Resolution<Id>
    where
        I: IntoIterator<Item = (Id, B)>,
        B: AsRef<[u8]>,
    {
        let target = Zeroizing::new(normalize_identity(target));
        let mut resolution = Resolution { id: None, scanned: 0, skipped: 0 };

        for (position, (id, blob)) in candidates.into_iter().enumerate() {
            resolution.scanned += 1;
            match self.matches(blob.as_ref(), &target) {
                Ok(true) => {
                    resolution.id = Some(id);
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    resolution.skipped += 1;
                    tracing::debug!(position, error = %err, "skipping undecryptable candidate");
                }
            }
        }

        tracing::debug!(
            scanned = resolution.scanned,
            skipped = resolution.skipped,
            matched = resolution.id.is_some(),
            "identity scan finished"
        );
        resolution
    }

    /// Finds a record through its stored blind index.
    ///
    /// Only candidates whose index equals the target's are decrypted, and a
    /// match is confirmed by decryption before it is returned. Candidates
    /// carry `(id, blind_index, blob)`.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexGenerationFailed` if the target index cannot be
    /// computed. Candidate failures are skipped as in a full scan.
    pub fn find_by_blind_index<Id, X, B, I>(
        &self,
        target: &str,
        indexer: &BlindIndexer,
        index_context: &IndexContext,
        candidates: I,
    ) -> Result<Option<Id>, Error>
    where
        I: IntoIterator<Item = (Id, X, B)>,
        X: AsRef<[u8]>,
        B: AsRef<[u8]>,
    {
        let wanted = indexer.index(target, index_context)?;
        let filtered = candidates
            .into_iter()
            .filter(|(_, index, _)| <X as AsRef<[u8]>>::as_ref(index) == wanted.as_slice())
            .map(|(id, _, blob)| (id, blob));

        Ok(self.find_by_identity(target, filtered))
    }

    fn matches(&self, blob: &[u8], normalized_target: &str) -> Result<bool, DecryptError> {
        let plaintext = Zeroizing::new(match &self.context {
            Some(context) => self.codec.decrypt_in(blob, context)?,
            None => self.codec.decrypt(blob)?,
        });
        let candidate = Zeroizing::new(normalize_identity(&plaintext));
        Ok(candidate.as_str() == normalized_target)
    }
}

/// Resolves `identity` against context-free identity blobs.
///
/// Collaborator-facing shorthand for
/// `IdentityResolver::new(codec).find_by_identity(identity, candidates)`.
pub fn resolve_identity<Id, B, I>(codec: &FieldCodec, identity: &str, candidates: I) -> Option<Id>
where
    I: IntoIterator<Item = (Id, B)>,
    B: AsRef<[u8]>,
{
    IdentityResolver::new(codec).find_by_identity(identity, candidates)
}
