pub mod config;
pub mod domain;
pub mod errors;

pub use chrono;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::evaluation::{Evaluation, EvaluationId, NewEvaluation};
pub use domain::report::{
    RiskAssessment, RiskFinding, RiskLevel, SourcingReport, SupplierAnalysis, SupplierLead,
    SupplierScorecard, TopSupplier, RISK_CATEGORIES,
};
pub use domain::supplier::{
    NewSupplier, Supplier, SupplierId, SupplierSummary, SupplierUpdate, SUPPLIER_SCHEMA_VERSION,
};
pub use errors::ApplicationError;
