//! `bibsift-recon` — Reconciliation decision engine for harvested
//! bibliographic records.
//!
//! Pure engine crate: receives pre-parsed records, returns classified
//! batches. No CLI or IO dependencies.

pub mod action;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod identity;
pub mod rules;

pub use catalog::{Catalog, CatalogError, SnapshotCatalog};
pub use engine::{run, Batches, EngineConfig, RunSummary};
pub use error::ReconError;
pub use identity::{Identity, IdentityConfig};
pub use rules::{Action, RuleIndex};
