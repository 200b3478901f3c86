//! `PostgreSQL` review store for the grade service.
//!
//! Implements [`ReviewStore`](grade_core::store::ReviewStore) on top of a sqlx
//! connection pool. The schema lives in `migrations/` and is applied with
//! [`PostgresReviewStore::migrate`].
//!
//! # Example
//!
//! ```ignore
//! use grade_postgres::PostgresReviewStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresReviewStore::connect("postgres://localhost/grade").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

mod review_store;

pub use review_store::PostgresReviewStore;
