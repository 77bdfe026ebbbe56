//! `adsgrid-recon`: ads report reconciliation and decision engine.
//!
//! Pure engine crate: receives pre-loaded workbooks, returns KPI and action
//! tables. No CLI or IO dependencies.

pub mod aggregate;
pub mod classify;
pub mod coerce;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod loaders;
pub mod model;
pub mod ranking;
pub mod resolve;
pub mod summary;

pub use config::{ReportConfig, ReportMode, RoasSource, Thresholds};
pub use engine::run;
pub use error::ReportError;
pub use model::{ReportInput, ReportResult};
