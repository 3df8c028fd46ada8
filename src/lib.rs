//! Morsel - food photo analysis
//!
//! Identifies the food in a photo, estimates its portion and calories through
//! a fallback chain of estimation strategies, and validates the final calorie
//! figure against physical evidence before it is returned.

pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod reconciler;
pub mod router;
pub mod strategy;
