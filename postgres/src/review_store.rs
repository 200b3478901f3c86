//! Review persistence on `PostgreSQL`.

use chrono::{DateTime, Utc};
use grade_core::review::{NewReview, Review, ReviewId, ReviewType};
use grade_core::store::{ReviewStore, ReviewStoreError, StoreFuture};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const REVIEW_COLUMNS: &str =
    "id, comment, grade, reviewer_id, subject_id, reviewer_name, modified_at, review_type";

/// `PostgreSQL`-backed [`ReviewStore`].
///
/// Cloning is cheap: clones share the connection pool.
#[derive(Clone, Debug)]
pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
    /// Use an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a fresh pool with sqlx defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::DatabaseError`] if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, ReviewStoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;
        Ok(Self::from_pool(pool))
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewStoreError::DatabaseError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ReviewStoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ReviewStoreError::DatabaseError(format!("Migration failed: {e}")))?;
        tracing::info!("Review store migrations applied");
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_one(&self, id: ReviewId) -> Result<Review, ReviewStoreError> {
        let row = sqlx::query(&format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        row.map_or(Err(ReviewStoreError::NotFound(id)), |row| review_from_row(&row))
    }

    async fn fetch_by_subject(
        &self,
        subject_id: &str,
        review_type: ReviewType,
    ) -> Result<Vec<Review>, ReviewStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE subject_id = $1 AND review_type = $2
             ORDER BY modified_at ASC, id ASC"
        ))
        .bind(subject_id)
        .bind(review_type.code())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        rows.iter().map(review_from_row).collect()
    }

    async fn insert_review(&self, review: NewReview) -> Result<ReviewId, ReviewStoreError> {
        let id = ReviewId::new();

        sqlx::query(
            r"
            INSERT INTO reviews (
                id, comment, grade, reviewer_id, subject_id,
                reviewer_name, modified_at, review_type
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(id.as_uuid())
        .bind(&review.comment)
        .bind(review.grade)
        .bind(&review.reviewer_id)
        .bind(&review.subject_id)
        .bind(&review.reviewer_name)
        .bind(review.modified_at)
        .bind(review.review_type.code())
        .execute(&self.pool)
        .await
        .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            review_id = %id,
            subject_id = %review.subject_id,
            review_type = %review.review_type,
            "Review inserted"
        );
        Ok(id)
    }

    async fn update_review(
        &self,
        id: ReviewId,
        comment: &str,
        grade: f32,
        modified_at: DateTime<Utc>,
    ) -> Result<Review, ReviewStoreError> {
        let row = sqlx::query(&format!(
            "UPDATE reviews SET comment = $2, grade = $3, modified_at = $4
             WHERE id = $1
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(comment)
        .bind(grade)
        .bind(modified_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        row.map_or(Err(ReviewStoreError::NotFound(id)), |row| review_from_row(&row))
    }

    async fn delete_review(&self, id: ReviewId) -> Result<(), ReviewStoreError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ReviewStoreError::NotFound(id));
        }
        Ok(())
    }

    async fn delete_every_review(&self) -> Result<u64, ReviewStoreError> {
        let result = sqlx::query("DELETE FROM reviews")
            .execute(&self.pool)
            .await
            .map_err(|e| ReviewStoreError::DatabaseError(e.to_string()))?;

        tracing::info!(deleted = result.rows_affected(), "All reviews deleted");
        Ok(result.rows_affected())
    }
}

fn review_from_row(row: &PgRow) -> Result<Review, ReviewStoreError> {
    let invalid = |e: sqlx::Error| ReviewStoreError::InvalidData(e.to_string());

    let code: i16 = row.try_get("review_type").map_err(invalid)?;
    let review_type = ReviewType::from_code(i64::from(code))
        .map_err(|e| ReviewStoreError::InvalidData(e.to_string()))?;
    let id: Uuid = row.try_get("id").map_err(invalid)?;

    Ok(Review {
        id: ReviewId::from_uuid(id),
        comment: row.try_get("comment").map_err(invalid)?,
        grade: row.try_get("grade").map_err(invalid)?,
        reviewer_id: row.try_get("reviewer_id").map_err(invalid)?,
        subject_id: row.try_get("subject_id").map_err(invalid)?,
        reviewer_name: row.try_get("reviewer_name").map_err(invalid)?,
        modified_at: row.try_get("modified_at").map_err(invalid)?,
        review_type,
    })
}

impl ReviewStore for PostgresReviewStore {
    fn get(&self, id: ReviewId) -> StoreFuture<'_, Review> {
        Box::pin(self.fetch_one(id))
    }

    fn find_by_subject<'a>(
        &'a self,
        subject_id: &'a str,
        review_type: ReviewType,
    ) -> StoreFuture<'a, Vec<Review>> {
        Box::pin(self.fetch_by_subject(subject_id, review_type))
    }

    fn insert(&self, review: NewReview) -> StoreFuture<'_, ReviewId> {
        Box::pin(self.insert_review(review))
    }

    fn update<'a>(
        &'a self,
        id: ReviewId,
        comment: &'a str,
        grade: f32,
        modified_at: DateTime<Utc>,
    ) -> StoreFuture<'a, Review> {
        Box::pin(self.update_review(id, comment, grade, modified_at))
    }

    fn delete(&self, id: ReviewId) -> StoreFuture<'_, ()> {
        Box::pin(self.delete_review(id))
    }

    fn delete_all(&self) -> StoreFuture<'_, u64> {
        Box::pin(self.delete_every_review())
    }
}
