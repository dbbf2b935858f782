//! Sqlite persistence for the sourcing agent: the shared connection pool,
//! embedded migrations, and the supplier and evaluation repositories.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect_with_settings, DbPool};
pub use repositories::{
    EvaluationRepository, RepositoryError, SqlEvaluationRepository, SqlSupplierRepository,
    SupplierRepository, UpdateOutcome,
};
