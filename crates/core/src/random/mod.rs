use rand::{rngs::StdRng, Rng, SeedableRng};

/// Seedable random source shared by the simulation and the compositor.
///
/// Every jitter, spawn roll and respawn position goes through this type so a
/// fixed seed reproduces a whole run.
#[derive(Debug, Clone)]
pub struct SceneRng {
    inner: StdRng,
}

impl SceneRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Uniform value in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform value in `[low, high)`. Returns `low` for an empty range.
    pub fn range(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.inner.gen_range(low..high)
    }

    /// Uniform value in `[-span / 2, span / 2)`.
    pub fn centered(&mut self, span: f32) -> f32 {
        (self.unit() - 0.5) * span
    }

    /// Returns `true` with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f32) -> bool {
        self.inner.gen_bool(f64::from(p.clamp(0.0, 1.0)))
    }

    /// Uniform integer in `[low, high]`.
    pub fn int_inclusive(&mut self, low: u32, high: u32) -> u32 {
        self.inner.gen_range(low..=high.max(low))
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.inner.gen_range(0..items.len());
        items.get(index)
    }
}

impl Default for SceneRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
