//! Shared test helpers

use rand::RngCore;

/// RNG that returns the same word forever, for pinning probability rolls
pub struct FixedRng(pub u32);

impl FixedRng {
    /// `random::<f32>()` yields 0.0: every `chance` roll succeeds
    pub const LOW: FixedRng = FixedRng(0);
    /// `random::<f32>()` yields just under 1.0: every `chance` roll fails
    pub const HIGH: FixedRng = FixedRng(u32::MAX);
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }

    fn next_u64(&mut self) -> u64 {
        ((self.0 as u64) << 32) | self.0 as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(self.0 as u8);
    }
}
