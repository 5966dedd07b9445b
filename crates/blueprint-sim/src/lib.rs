//! Blueprint Sim - in-memory stand-in for the blueprint generation service
//!
//! [`SimulatedBlueprintService`] implements both collaborator traits of
//! `blueprint-core`: it accepts generation requests, reuses recent jobs of the
//! same engagement, walks each new job through the service stages and pushes
//! every stage to subscribers.

pub mod catalog;
pub mod config;
pub mod payload;
pub mod service;

pub use catalog::{EngagementCatalog, EngagementProfile};
pub use config::SimulationConfig;
pub use service::SimulatedBlueprintService;
