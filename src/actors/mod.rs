// ============================================================================
// Actors Module
// ============================================================================
//
// Each customer and each worker is its own tokio task driving a state
// machine against the shared office. The coordinator owns their lifecycle.
//
// Structure:
// - core/           - Phase state machines and per-actor randomness
// - infrastructure/ - Coordinator and activity monitor
// - customer, worker - The simulated actors
//
// ============================================================================

pub mod core;
pub mod customer;
pub mod infrastructure;
pub mod worker;

pub use customer::{CustomerActor, CustomerOutcome};
pub use infrastructure::{ActivityMonitor, ActivityReport, OfficeCoordinator, RunSummary};
pub use worker::{WorkerActor, WorkerOutcome};
