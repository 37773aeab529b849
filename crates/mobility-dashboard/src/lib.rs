//! Mobility Dashboard - Application Library
//!
//! This is the main application crate that wires the mobility data model into
//! an egui map dashboard with three views: dataset explorer, heatmap viewer,
//! and route planner.

mod app;

pub use app::MobilityDashboardApp;
