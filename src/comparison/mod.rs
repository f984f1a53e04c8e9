//! Comparison runs: plugin fan-out, scoring and report assembly.

pub mod cancellation;
pub mod executor;
pub mod orchestrator;
pub mod report;
pub mod state;

pub use cancellation::CancellationToken;
pub use executor::{Executor, Invocation, InvocationResult, Side};
pub use orchestrator::{CompletedRun, Orchestrator};
pub use report::{ComparisonReport, DimensionOutcome, DimensionRow, SettingsSnapshot, SCHEMA_VERSION};
pub use state::{RunState, RunTracker};
