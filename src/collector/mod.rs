//! Collection cycle
//!
//! Fetch, normalize and fan out one tick per configured asset, with every
//! asset and every sink write isolated from the others.

mod cycle;
mod report;
mod scheduler;

pub use cycle::{normalize_asset_ids, Collector};
pub use report::{AssetOutcome, AssetStatus, CycleReport, StepOutcome};
pub use scheduler::Scheduler;
