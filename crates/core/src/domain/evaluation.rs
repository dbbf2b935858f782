use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::supplier::SupplierId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvaluationId(pub i64);

/// One scored criterion for a supplier. Many evaluations may reference the
/// same supplier; there is no cardinality limit and no automatic deletion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: EvaluationId,
    pub supplier_id: SupplierId,
    pub criteria: String,
    pub score: f64,
    pub notes: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub supplier_id: SupplierId,
    pub criteria: String,
    pub score: f64,
    #[serde(default)]
    pub notes: Option<String>,
}
