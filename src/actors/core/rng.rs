use crate::models::ActorId;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Coordinator's own stream, kept apart from every actor id
const COORDINATOR_STREAM: u64 = 0;

/// Private PRNG for one actor, derived from the run seed and the actor's
/// identity so runs with the same seed replay the same random choices.
pub fn actor_rng(seed: u64, actor: ActorId) -> StdRng {
    let role: u64 = if actor.is_customer() { 1 } else { 2 };
    StdRng::seed_from_u64(mix(seed, (role << 32) | u64::from(actor.number())))
}

pub fn coordinator_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(mix(seed, COORDINATOR_STREAM))
}

// splitmix64 finalizer over seed + stream
fn mix(seed: u64, stream: u64) -> u64 {
    let mut z = seed
        .wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
