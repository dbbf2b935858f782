use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sourcing_core::chrono::{DateTime, Utc};
use sourcing_core::domain::supplier::{
    NewSupplier, Supplier, SupplierId, SupplierSummary, SupplierUpdate, SUPPLIER_SCHEMA_VERSION,
};
use sqlx::{sqlite::SqliteRow, Row};

use super::{RepositoryError, SupplierRepository, UpdateOutcome};
use crate::DbPool;

pub struct SqlSupplierRepository {
    pool: DbPool,
}

impl SqlSupplierRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SupplierRepository for SqlSupplierRepository {
    async fn store(&self, supplier: NewSupplier) -> Result<SupplierId, RepositoryError> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (
                schema_version, name, website, country, city,
                product_categories, contact_info, certifications, capabilities,
                financial_info, risk_assessment, performance_scores,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(SUPPLIER_SCHEMA_VERSION)
        .bind(&supplier.name)
        .bind(supplier.website.as_deref())
        .bind(supplier.country.as_deref())
        .bind(supplier.city.as_deref())
        .bind(encode_json(&supplier.product_categories)?)
        .bind(encode_json(&supplier.contact_info)?)
        .bind(encode_json(&supplier.certifications)?)
        .bind(encode_json(&supplier.capabilities)?)
        .bind(encode_json(&supplier.financial_info)?)
        .bind(encode_json(&supplier.risk_assessment)?)
        .bind(encode_json(&supplier.performance_scores)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(SupplierId(result.last_insert_rowid()))
    }

    async fn get(&self, id: SupplierId) -> Result<Option<Supplier>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                id, schema_version, name, website, country, city,
                product_categories, contact_info, certifications, capabilities,
                financial_info, risk_assessment, performance_scores,
                created_at, updated_at
            FROM suppliers
            WHERE id = ?
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|value| supplier_from_row(&value)).transpose()
    }

    async fn search(&self, query: &str) -> Result<Vec<SupplierSummary>, RepositoryError> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query(
            r#"
            SELECT id, name, website, country, product_categories
            FROM suppliers
            WHERE name LIKE ?1 OR product_categories LIKE ?1 OR country LIKE ?1
            ORDER BY name
            "#,
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    async fn update(
        &self,
        id: SupplierId,
        update: SupplierUpdate,
    ) -> Result<UpdateOutcome, RepositoryError> {
        if update.is_empty() {
            return Ok(UpdateOutcome::NoFields);
        }

        // Column names come from this enumerated list only; values are all
        // bound as parameters.
        let mut assignments: Vec<(&'static str, String)> = Vec::new();
        if let Some(name) = update.name {
            assignments.push(("name", name));
        }
        if let Some(website) = update.website {
            assignments.push(("website", website));
        }
        if let Some(country) = update.country {
            assignments.push(("country", country));
        }
        if let Some(city) = update.city {
            assignments.push(("city", city));
        }
        if let Some(product_categories) = update.product_categories {
            assignments.push(("product_categories", encode_json(&product_categories)?));
        }
        if let Some(contact_info) = update.contact_info {
            assignments.push(("contact_info", encode_json(&contact_info)?));
        }
        if let Some(certifications) = update.certifications {
            assignments.push(("certifications", encode_json(&certifications)?));
        }
        if let Some(capabilities) = update.capabilities {
            assignments.push(("capabilities", encode_json(&capabilities)?));
        }
        if let Some(financial_info) = update.financial_info {
            assignments.push(("financial_info", encode_json(&financial_info)?));
        }
        if let Some(risk_assessment) = update.risk_assessment {
            assignments.push(("risk_assessment", encode_json(&risk_assessment)?));
        }
        if let Some(performance_scores) = update.performance_scores {
            assignments.push(("performance_scores", encode_json(&performance_scores)?));
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE suppliers SET {set_clause}, updated_at = ? WHERE id = ?");

        let mut statement = sqlx::query(&sql);
        for (_, value) in &assignments {
            statement = statement.bind(value);
        }
        let result = statement.bind(Utc::now().to_rfc3339()).bind(id.0).execute(&self.pool).await?;

        if result.rows_affected() > 0 {
            Ok(UpdateOutcome::Updated)
        } else {
            Ok(UpdateOutcome::NotFound)
        }
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|error| RepositoryError::Decode(format!("failed to encode nested field: {error}")))
}

fn decode_json<T: DeserializeOwned>(column: &str, raw: &str) -> Result<T, RepositoryError> {
    serde_json::from_str(raw).map_err(|error| {
        RepositoryError::Decode(format!("failed to decode `{column}` column: {error}"))
    })
}

fn decode_timestamp(column: &str, raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw).map(|value| value.with_timezone(&Utc)).map_err(|error| {
        RepositoryError::Decode(format!("failed to decode `{column}` timestamp: {error}"))
    })
}

fn supplier_from_row(row: &SqliteRow) -> Result<Supplier, RepositoryError> {
    let schema_version: i64 = row.try_get("schema_version")?;
    if schema_version > SUPPLIER_SCHEMA_VERSION {
        return Err(RepositoryError::Decode(format!(
            "supplier row has schema_version {schema_version}, newer than supported {SUPPLIER_SCHEMA_VERSION}"
        )));
    }

    Ok(Supplier {
        id: SupplierId(row.try_get("id")?),
        name: row.try_get("name")?,
        website: row.try_get("website")?,
        country: row.try_get("country")?,
        city: row.try_get("city")?,
        product_categories: decode_json::<Vec<String>>(
            "product_categories",
            row.try_get("product_categories")?,
        )?,
        contact_info: decode_json::<BTreeMap<String, String>>(
            "contact_info",
            row.try_get("contact_info")?,
        )?,
        certifications: decode_json::<Vec<String>>(
            "certifications",
            row.try_get("certifications")?,
        )?,
        capabilities: decode_json::<BTreeMap<String, String>>(
            "capabilities",
            row.try_get("capabilities")?,
        )?,
        financial_info: decode_json::<BTreeMap<String, String>>(
            "financial_info",
            row.try_get("financial_info")?,
        )?,
        risk_assessment: decode_json::<BTreeMap<String, String>>(
            "risk_assessment",
            row.try_get("risk_assessment")?,
        )?,
        performance_scores: decode_json::<BTreeMap<String, f64>>(
            "performance_scores",
            row.try_get("performance_scores")?,
        )?,
        created_at: decode_timestamp("created_at", row.try_get("created_at")?)?,
        updated_at: decode_timestamp("updated_at", row.try_get("updated_at")?)?,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<SupplierSummary, RepositoryError> {
    Ok(SupplierSummary {
        id: SupplierId(row.try_get("id")?),
        name: row.try_get("name")?,
        website: row.try_get("website")?,
        country: row.try_get("country")?,
        product_categories: decode_json::<Vec<String>>(
            "product_categories",
            row.try_get("product_categories")?,
        )?,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sourcing_core::domain::supplier::{NewSupplier, SupplierId, SupplierUpdate};

    use super::SqlSupplierRepository;
    use crate::repositories::{SupplierRepository, UpdateOutcome};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlSupplierRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlSupplierRepository::new(pool)
    }

    fn sample_supplier() -> NewSupplier {
        let mut contact_info = BTreeMap::new();
        contact_info.insert("email".to_string(), "sales@acme-electronics.example".to_string());
        contact_info.insert("phone".to_string(), "+49 30 1234567".to_string());

        let mut capabilities = BTreeMap::new();
        capabilities.insert("oem".to_string(), "yes".to_string());
        capabilities.insert("monthly_capacity".to_string(), "50000 units".to_string());

        let mut performance_scores = BTreeMap::new();
        performance_scores.insert("quality".to_string(), 8.5);
        performance_scores.insert("delivery".to_string(), 7.0);

        NewSupplier {
            name: "Acme Electronics GmbH".to_string(),
            website: Some("https://acme-electronics.example".to_string()),
            country: Some("Germany".to_string()),
            city: Some("Berlin".to_string()),
            product_categories: vec![
                "electronic components".to_string(),
                "sensors".to_string(),
            ],
            contact_info,
            certifications: vec!["ISO9001".to_string(), "RoHS".to_string()],
            capabilities,
            financial_info: BTreeMap::new(),
            risk_assessment: BTreeMap::new(),
            performance_scores,
        }
    }

    #[tokio::test]
    async fn store_then_get_round_trips_nested_fields() {
        let repo = repository().await;
        let input = sample_supplier();

        let id = repo.store(input.clone()).await.expect("store supplier");
        let fetched = repo.get(id).await.expect("get supplier").expect("supplier present");

        assert_eq!(fetched.name, input.name);
        assert_eq!(fetched.product_categories, input.product_categories);
        assert_eq!(fetched.contact_info, input.contact_info);
        assert_eq!(fetched.certifications, input.certifications);
        assert_eq!(fetched.capabilities, input.capabilities);
        assert_eq!(fetched.performance_scores, input.performance_scores);
    }

    #[tokio::test]
    async fn get_missing_supplier_returns_none() {
        let repo = repository().await;
        let fetched = repo.get(SupplierId(4242)).await.expect("get supplier");
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn search_matches_name_category_and_country_case_insensitively() {
        let repo = repository().await;
        repo.store(sample_supplier()).await.expect("store supplier");
        repo.store(NewSupplier {
            name: "Pacific Plastics Co".to_string(),
            country: Some("Vietnam".to_string()),
            product_categories: vec!["injection molding".to_string()],
            ..NewSupplier::default()
        })
        .await
        .expect("store second supplier");

        let by_name = repo.search("acme").await.expect("search by name");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Acme Electronics GmbH");

        let by_category = repo.search("SENSORS").await.expect("search by category");
        assert_eq!(by_category.len(), 1);

        let by_country = repo.search("vietnam").await.expect("search by country");
        assert_eq!(by_country.len(), 1);
        assert_eq!(by_country[0].name, "Pacific Plastics Co");

        let no_match = repo.search("titanium").await.expect("search without match");
        assert!(no_match.is_empty());
    }

    #[tokio::test]
    async fn search_orders_results_by_name() {
        let repo = repository().await;
        for name in ["Zenith Components", "Acme Electronics GmbH", "Midland Supply"] {
            repo.store(NewSupplier {
                name: name.to_string(),
                country: Some("Germany".to_string()),
                ..NewSupplier::default()
            })
            .await
            .expect("store supplier");
        }

        let results = repo.search("germany").await.expect("search by country");
        let names: Vec<&str> = results.iter().map(|summary| summary.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Electronics GmbH", "Midland Supply", "Zenith Components"]);
    }

    #[tokio::test]
    async fn empty_update_reports_no_fields_and_leaves_row_unchanged() {
        let repo = repository().await;
        let id = repo.store(sample_supplier()).await.expect("store supplier");
        let before = repo.get(id).await.expect("get supplier").expect("supplier present");

        let outcome = repo.update(id, SupplierUpdate::default()).await.expect("empty update");
        assert_eq!(outcome, UpdateOutcome::NoFields);

        let after = repo.get(id).await.expect("get supplier").expect("supplier present");
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn update_rewrites_only_supplied_fields() {
        let repo = repository().await;
        let id = repo.store(sample_supplier()).await.expect("store supplier");

        let mut performance_scores = BTreeMap::new();
        performance_scores.insert("quality".to_string(), 9.5);
        let outcome = repo
            .update(
                id,
                SupplierUpdate {
                    country: Some("Austria".to_string()),
                    performance_scores: Some(performance_scores.clone()),
                    ..SupplierUpdate::default()
                },
            )
            .await
            .expect("update supplier");
        assert_eq!(outcome, UpdateOutcome::Updated);

        let after = repo.get(id).await.expect("get supplier").expect("supplier present");
        assert_eq!(after.country.as_deref(), Some("Austria"));
        assert_eq!(after.performance_scores, performance_scores);
        assert_eq!(after.name, "Acme Electronics GmbH");
        assert_eq!(after.certifications, vec!["ISO9001".to_string(), "RoHS".to_string()]);
        assert!(after.updated_at >= after.created_at);
    }

    #[tokio::test]
    async fn malformed_schema_version_surfaces_an_error() {
        let repo = repository().await;
        let id = repo.store(sample_supplier()).await.expect("store supplier");

        sqlx::query("UPDATE suppliers SET schema_version = 'not-a-version' WHERE id = ?")
            .bind(id.0)
            .execute(&repo.pool)
            .await
            .expect("corrupt stored row");

        assert!(repo.get(id).await.is_err());
    }

    #[tokio::test]
    async fn update_missing_supplier_reports_not_found() {
        let repo = repository().await;
        let outcome = repo
            .update(
                SupplierId(999),
                SupplierUpdate { name: Some("Ghost".to_string()), ..SupplierUpdate::default() },
            )
            .await
            .expect("update missing supplier");
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }
}
