//! Context types binding ciphertexts and indexes to their column.

use std::fmt;

/// Where an encrypted field lives, bound into the blob as associated data.
///
/// A blob sealed for `patients.email` will not decrypt as `patients.phone`,
/// so rows cannot have their encrypted columns swapped without detection.
///
/// # Example
///
/// ```
/// use fieldseal::context::EncryptionContext;
///
/// let ctx = EncryptionContext::new("patients", "email").with_tenant("clinic_7");
/// assert_eq!(ctx.to_string(), "clinic_7|patients|email");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncryptionContext {
    tenant_id: Option<String>,
    table_name: String,
    column_name: String,
}

impl EncryptionContext {
    /// Creates a new encryption context.
    ///
    /// # Arguments
    ///
    /// * `table_name` - Table holding the field
    /// * `column_name` - Column holding the field
    #[must_use]
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self { tenant_id: None, table_name: table_name.into(), column_name: column_name.into() }
    }

    /// Sets the tenant ID for multi-tenant deployments.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Returns the tenant ID, if set.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }
}

impl fmt::Display for EncryptionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.tenant_id.as_deref().unwrap_or("default"),
            self.table_name,
            self.column_name
        )
    }
}

/// Context for blind index generation.
///
/// Kept separate from `EncryptionContext` so index and ciphertext domains
/// never collide even for the same column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexContext {
    tenant_id: Option<String>,
    table_name: String,
    column_name: String,
}

impl IndexContext {
    /// Creates a new index context.
    #[must_use]
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self { tenant_id: None, table_name: table_name.into(), column_name: column_name.into() }
    }

    /// Sets the tenant ID.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Returns the tenant ID, if set.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }
}

impl fmt::Display for IndexContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "idx|{}|{}|{}",
            self.tenant_id.as_deref().unwrap_or("default"),
            self.table_name,
            self.column_name
        )
    }
}

impl From<&EncryptionContext> for IndexContext {
    fn from(ctx: &EncryptionContext) -> Self {
        Self {
            tenant_id: ctx.tenant_id.clone(),
            table_name: ctx.table_name.clone(),
            column_name: ctx.column_name.clone(),
        }
    }
}
