// ============================================================================
// Core Actor Abstractions
// ============================================================================
//
// Types shared by every actor: the phase state machines and per-actor
// randomness.
//
// ============================================================================

pub mod phase;
pub mod rng;

// Re-export core types
pub use phase::*;
pub use rng::*;
