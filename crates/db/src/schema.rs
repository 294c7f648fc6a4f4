//! Company schema qualification.
//!
//! Every company keeps its ledger in its own schema. Schema names cannot be
//! bound as query parameters, so they are validated once and then spliced
//! into table references.

use std::fmt;

use balanza_core::statement::{DataAccessError, is_schema_identifier};

/// A validated company schema name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySchema(String);

impl CompanySchema {
    /// Validates `company` as a schema name.
    ///
    /// # Errors
    ///
    /// Returns an error if `company` is not a plain identifier.
    pub fn parse(company: &str) -> Result<Self, DataAccessError> {
        if is_schema_identifier(company) {
            Ok(Self(company.to_ascii_lowercase()))
        } else {
            Err(DataAccessError::new(format!(
                "invalid company schema: {company:?}"
            )))
        }
    }

    /// Schema-qualified reference to `table`.
    #[must_use]
    pub fn table(&self, table: &str) -> String {
        format!("{}.{table}", self.0)
    }

    /// Schema name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanySchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
