use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current version of the encoded supplier row. Bump when the nested-field
/// encoding changes shape; decoders reject rows from the future.
pub const SUPPLIER_SCHEMA_VERSION: i64 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierId(pub i64);

impl std::fmt::Display for SupplierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored supplier record. Identity is the auto-assigned row key; no
/// uniqueness is enforced beyond it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    pub website: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub product_categories: Vec<String>,
    pub contact_info: BTreeMap<String, String>,
    pub certifications: Vec<String>,
    pub capabilities: BTreeMap<String, String>,
    pub financial_info: BTreeMap<String, String>,
    pub risk_assessment: BTreeMap<String, String>,
    pub performance_scores: BTreeMap<String, f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert shape: everything the caller supplies before a key and timestamps
/// are assigned on `store`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub product_categories: Vec<String>,
    #[serde(default)]
    pub contact_info: BTreeMap<String, String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub capabilities: BTreeMap<String, String>,
    #[serde(default)]
    pub financial_info: BTreeMap<String, String>,
    #[serde(default)]
    pub risk_assessment: BTreeMap<String, String>,
    #[serde(default)]
    pub performance_scores: BTreeMap<String, f64>,
}

/// The enumerated set of updatable supplier fields. Only fields set to
/// `Some` are written; unknown column names are unrepresentable, which
/// closes the dynamic field-name injection hole of the original design.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SupplierUpdate {
    pub name: Option<String>,
    pub website: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub product_categories: Option<Vec<String>>,
    pub contact_info: Option<BTreeMap<String, String>>,
    pub certifications: Option<Vec<String>>,
    pub capabilities: Option<BTreeMap<String, String>>,
    pub financial_info: Option<BTreeMap<String, String>>,
    pub risk_assessment: Option<BTreeMap<String, String>>,
    pub performance_scores: Option<BTreeMap<String, f64>>,
}

impl SupplierUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.website.is_none()
            && self.country.is_none()
            && self.city.is_none()
            && self.product_categories.is_none()
            && self.contact_info.is_none()
            && self.certifications.is_none()
            && self.capabilities.is_none()
            && self.financial_info.is_none()
            && self.risk_assessment.is_none()
            && self.performance_scores.is_none()
    }
}

/// Condensed row returned by substring search, ordered by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SupplierSummary {
    pub id: SupplierId,
    pub name: String,
    pub website: Option<String>,
    pub country: Option<String>,
    pub product_categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::SupplierUpdate;

    #[test]
    fn default_update_is_empty() {
        assert!(SupplierUpdate::default().is_empty());
    }

    #[test]
    fn update_with_one_field_is_not_empty() {
        let update =
            SupplierUpdate { country: Some("Germany".to_string()), ..SupplierUpdate::default() };
        assert!(!update.is_empty());
    }
}
