//! ubiplan-core — a budget-neutral UBI microsimulation engine.
//!
//! Given a prepared household survey extract and a policy-reform
//! selection (taxes repealed, benefits removed, a flat tax on AGI, and
//! who counts toward the UBI), the engine computes the uniform per-person
//! payment that spends the net new revenue exactly, then measures the
//! distributional effects — poverty rate and gap, Gini, winners, and
//! per-demographic breakdowns — against precomputed baselines.
//!
//! The canonical tables load once and are read-only for the process
//! lifetime; every reform computation works on its own private derived
//! table, so one engine can serve concurrent requests safely.

pub mod baseline;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod report;
pub mod selection;
pub mod stats;
pub mod synthetic;
pub mod types;
