use async_trait::async_trait;
use thiserror::Error;

use sourcing_core::domain::evaluation::{Evaluation, EvaluationId, NewEvaluation};
use sourcing_core::domain::supplier::{
    NewSupplier, Supplier, SupplierId, SupplierSummary, SupplierUpdate,
};

pub mod evaluation;
pub mod supplier;

pub use evaluation::SqlEvaluationRepository;
pub use supplier::SqlSupplierRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of a field-wise supplier update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    NoFields,
}

impl UpdateOutcome {
    pub fn describe(&self, id: SupplierId) -> String {
        match self {
            Self::Updated => format!("supplier {id} updated successfully"),
            Self::NotFound => format!("supplier {id} not found"),
            Self::NoFields => "no fields to update".to_string(),
        }
    }
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    /// Insert a record and return its auto-assigned key.
    async fn store(&self, supplier: NewSupplier) -> Result<SupplierId, RepositoryError>;

    async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError>;

    /// Substring match across name, encoded category list, and country,
    /// ordered by name. Matching is case-insensitive for ASCII.
    async fn search(&self, query: &str) -> Result<Vec<SupplierSummary>, RepositoryError>;

    /// Rewrite only the supplied fields. Refreshes `updated_at` on success.
    async fn update(
        &self,
        id: SupplierId,
        update: SupplierUpdate,
    ) -> Result<UpdateOutcome, RepositoryError>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn record(&self, evaluation: NewEvaluation) -> Result<EvaluationId, RepositoryError>;

    async fn list_for_supplier(
        &self,
        supplier_id: SupplierId,
    ) -> Result<Vec<Evaluation>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use sourcing_core::domain::supplier::SupplierId;

    use super::UpdateOutcome;

    #[test]
    fn update_outcomes_describe_themselves() {
        let id = SupplierId(7);
        assert_eq!(UpdateOutcome::Updated.describe(id), "supplier 7 updated successfully");
        assert_eq!(UpdateOutcome::NotFound.describe(id), "supplier 7 not found");
        assert_eq!(UpdateOutcome::NoFields.describe(id), "no fields to update");
    }
}
