//! Addon host - discovers, loads, and routes events to disk addons

pub mod addons;
pub mod application;
pub mod domain;
pub mod infrastructure;
