//! Stochastic simulation of a virus population inside a host, with and without
//! drug treatment.
//!
//! The core lives in [`virus`] and [`host`]; the remaining modules run many
//! independent trials and average their population time series.

pub mod analysis;
pub mod config;
pub mod engine;
pub mod host;
pub mod manager;
pub mod model;
pub mod stats;
mod utils;
pub mod virus;

pub use host::{Host, TreatedHost};
pub use virus::{Birth, Drugs, Resistances, ResistantVirus, SimpleVirus, Virus};
