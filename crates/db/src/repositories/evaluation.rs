use async_trait::async_trait;
use sourcing_core::chrono::{DateTime, Utc};
use sourcing_core::domain::evaluation::{Evaluation, EvaluationId, NewEvaluation};
use sourcing_core::domain::supplier::SupplierId;
use sqlx::{sqlite::SqliteRow, Row};

use super::{EvaluationRepository, RepositoryError};
use crate::DbPool;

pub struct SqlEvaluationRepository {
    pool: DbPool,
}

impl SqlEvaluationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationRepository for SqlEvaluationRepository {
    async fn record(&self, evaluation: NewEvaluation) -> Result<EvaluationId, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO evaluations (supplier_id, criteria, score, notes, evaluated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(evaluation.supplier_id.0)
        .bind(&evaluation.criteria)
        .bind(evaluation.score)
        .bind(evaluation.notes.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(EvaluationId(result.last_insert_rowid()))
    }

    async fn list_for_supplier(
        &self,
        supplier_id: SupplierId,
    ) -> Result<Vec<Evaluation>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, supplier_id, criteria, score, notes, evaluated_at
            FROM evaluations
            WHERE supplier_id = ?
            ORDER BY evaluated_at DESC, id DESC
            "#,
        )
        .bind(supplier_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(evaluation_from_row).collect()
    }
}

fn evaluation_from_row(row: &SqliteRow) -> Result<Evaluation, RepositoryError> {
    let raw_timestamp: String = row.try_get("evaluated_at")?;
    let evaluated_at = DateTime::parse_from_rfc3339(&raw_timestamp)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|error| {
            RepositoryError::Decode(format!("failed to decode `evaluated_at` timestamp: {error}"))
        })?;

    Ok(Evaluation {
        id: EvaluationId(row.try_get("id")?),
        supplier_id: SupplierId(row.try_get("supplier_id")?),
        criteria: row.try_get("criteria")?,
        score: row.try_get("score")?,
        notes: row.try_get("notes")?,
        evaluated_at,
    })
}
