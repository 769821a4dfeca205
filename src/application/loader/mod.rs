//! Discovery and loading pipeline

pub mod discovery;
pub mod report;
pub mod tiers;

pub use discovery::discover;
pub use report::{KindCounts, LoadResult, LoadSummary};
pub use tiers::load_all;
