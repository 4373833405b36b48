pub mod achievements;
pub mod batch;
pub mod complete;
pub mod dashboard;
pub mod habit;
pub mod overrides;
pub mod today;
