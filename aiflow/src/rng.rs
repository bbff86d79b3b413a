//! Deterministic random numbers for routing nodes.
//!
//! Not cryptographic. A context hands each activation a generator seeded from
//! the graph seed, the node id and the node's activation count, so a run with a
//! fixed seed always takes the same random routes.

/// SplitMix64 generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowRng {
    state: u64,
}

impl FlowRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        mix64(self.state)
    }

    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform float in `[0, 1)` with 24 bits of precision.
    pub fn next_f32_unit(&mut self) -> f32 {
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    /// Uniform integer in `[0, max]`.
    pub fn range_inclusive(&mut self, max: u32) -> u32 {
        let span = u64::from(max) + 1;
        (self.next_u64() % span) as u32
    }

    /// Uniform float in `[0, max)`.
    pub fn range_f32(&mut self, max: f32) -> f32 {
        self.next_f32_unit() * max
    }
}

pub fn mix64(mut x: u64) -> u64 {
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// Seed for one activation of one node.
pub fn derive_seed(graph_seed: u64, node: u64, activation: u64) -> u64 {
    let x = graph_seed ^ mix64(node.wrapping_add(0x9E37_79B9_7F4A_7C15)) ^ mix64(activation);
    mix64(x)
}
