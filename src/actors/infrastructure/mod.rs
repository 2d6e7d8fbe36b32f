// ============================================================================
// Infrastructure Actors
// ============================================================================
//
// Actors that run the simulation rather than take part in it:
// - Activity monitoring
// - Coordination and shutdown
//
// ============================================================================

// Private module declarations
mod activity_monitor;
mod coordinator;

// Re-export for public API
pub use activity_monitor::{
    report_phase, ActivityMonitor, ActivityReport, ActorActivity, GetActivity, PhaseChanged,
};
pub use coordinator::{OfficeCoordinator, RunSummary};
