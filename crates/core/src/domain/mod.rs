pub mod evaluation;
pub mod report;
pub mod supplier;
