//! Workspace configuration parameters.

use crate::error::ConfigError;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// How segments are sized when an arena grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OverAllocationPolicy {
    /// A growth segment is exactly `max(request, initial size)`.
    Strict,
    /// A growth segment is padded by `percent`% beyond `max(request, initial size)`.
    Overallocate {
        /// Padding as a percentage of the base segment size. Must be non-zero.
        percent: u32,
    },
}

/// What happens when an allocation does not fit the arena's current capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrowthPolicy {
    /// Fail with an exhaustion error.
    Fail,
    /// Append a new segment, up to `max_size_bytes` if set.
    Grow,
}

/// When arena storage is recycled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReusePolicy {
    /// Reset the arena when its outermost scope closes, once every
    /// `cycles_before_reset` cycles.
    ResetOnExit,
    /// Never reset automatically. Storage is only recycled by an explicit reset.
    Retain,
}

/// Immutable policy for one workspace arena.
///
/// Supplied by the caller and bound to a role through the manager. An arena
/// is created from the configuration on first entry and reused while the
/// configuration is unchanged. Validated when the arena is created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkspaceConfig {
    /// Size of the first segment in bytes. Rounded up to whole `f32` elements.
    ///
    /// Default: 1 MiB. Zero is only valid with [`GrowthPolicy::Grow`].
    pub initial_size_bytes: usize,

    /// Hard cap on total segment capacity in bytes. `None` is unbounded.
    pub max_size_bytes: Option<usize>,

    /// Sizing rule for growth segments.
    pub over_allocation: OverAllocationPolicy,

    /// Behaviour when capacity is insufficient.
    pub growth: GrowthPolicy,

    /// When storage is recycled.
    pub reuse: ReusePolicy,

    /// Completed outermost scope cycles between resets under
    /// [`ReusePolicy::ResetOnExit`]. Must be at least 1.
    pub cycles_before_reset: u32,
}

impl WorkspaceConfig {
    /// Default initial arena size: 1 MiB.
    pub const DEFAULT_INITIAL_SIZE_BYTES: usize = 1024 * 1024;

    /// Default number of cycles between resets.
    pub const DEFAULT_CYCLES_BEFORE_RESET: u32 = 1;

    /// Create a config with the given initial size and defaults elsewhere.
    pub fn new(initial_size_bytes: usize) -> Self {
        Self {
            initial_size_bytes,
            max_size_bytes: None,
            over_allocation: OverAllocationPolicy::Strict,
            growth: GrowthPolicy::Grow,
            reuse: ReusePolicy::ResetOnExit,
            cycles_before_reset: Self::DEFAULT_CYCLES_BEFORE_RESET,
        }
    }

    /// A fixed-size arena: never grows, fails when full.
    pub fn fixed(size_bytes: usize) -> Self {
        Self::new(size_bytes).with_growth(GrowthPolicy::Fail)
    }

    /// Set the capacity cap.
    pub fn with_max_size_bytes(mut self, max: usize) -> Self {
        self.max_size_bytes = Some(max);
        self
    }

    /// Set the over-allocation policy.
    pub fn with_over_allocation(mut self, policy: OverAllocationPolicy) -> Self {
        self.over_allocation = policy;
        self
    }

    /// Set the growth policy.
    pub fn with_growth(mut self, policy: GrowthPolicy) -> Self {
        self.growth = policy;
        self
    }

    /// Set the reuse policy.
    pub fn with_reuse(mut self, policy: ReusePolicy) -> Self {
        self.reuse = policy;
        self
    }

    /// Set the number of cycles between resets.
    pub fn with_cycles_before_reset(mut self, cycles: u32) -> Self {
        self.cycles_before_reset = cycles;
        self
    }

    /// Check field ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycles_before_reset == 0 {
            return Err(ConfigError::InvalidConfig {
                reason: "cycles_before_reset must be >= 1".into(),
            });
        }
        if self.initial_size_bytes == 0 && self.growth == GrowthPolicy::Fail {
            return Err(ConfigError::InvalidConfig {
                reason: "initial_size_bytes is 0 and growth is Fail; the arena could never allocate"
                    .into(),
            });
        }
        // Compared in whole elements: the first segment rounds up, the cap rounds down.
        if let (Some(max), Some(max_elements)) = (self.max_size_bytes, self.max_elements()) {
            if max_elements < self.initial_elements() {
                return Err(ConfigError::InvalidConfig {
                    reason: format!(
                        "max_size_bytes ({max}) cannot hold the initial segment of {} bytes",
                        self.initial_elements() * F32_BYTES
                    ),
                });
            }
        }
        if self.over_allocation == (OverAllocationPolicy::Overallocate { percent: 0 }) {
            return Err(ConfigError::InvalidConfig {
                reason: "Overallocate percent must be non-zero; use Strict instead".into(),
            });
        }
        Ok(())
    }

    /// Initial segment length in `f32` elements.
    pub fn initial_elements(&self) -> usize {
        self.initial_size_bytes.div_ceil(F32_BYTES)
    }

    /// Capacity cap in `f32` elements, if any.
    pub fn max_elements(&self) -> Option<usize> {
        self.max_size_bytes.map(|b| b / F32_BYTES)
    }

    /// Length of a growth segment that must hold `request` elements.
    pub fn growth_segment_elements(&self, request: usize) -> usize {
        let base = request.max(self.initial_elements());
        match self.over_allocation {
            OverAllocationPolicy::Strict => base,
            OverAllocationPolicy::Overallocate { percent } => {
                let pad = base.saturating_mul(percent as usize) / 100;
                base.saturating_add(pad)
            }
        }
    }
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INITIAL_SIZE_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_mebibyte_growable() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.initial_size_bytes, 1024 * 1024);
        assert_eq!(config.growth, GrowthPolicy::Grow);
        assert_eq!(config.reuse, ReusePolicy::ResetOnExit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn initial_elements_rounds_up() {
        assert_eq!(WorkspaceConfig::new(10).initial_elements(), 3);
        assert_eq!(WorkspaceConfig::new(16).initial_elements(), 4);
    }

    #[test]
    fn zero_cycles_rejected() {
        let config = WorkspaceConfig::default().with_cycles_before_reset(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn zero_size_fixed_rejected() {
        assert!(WorkspaceConfig::fixed(0).validate().is_err());
        assert!(WorkspaceConfig::new(0).validate().is_ok());
    }

    #[test]
    fn max_below_initial_rejected() {
        let config = WorkspaceConfig::new(1024).with_max_size_bytes(512);
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_that_cannot_hold_rounded_initial_segment_rejected() {
        // 10 bytes round up to a 3-element (12-byte) first segment.
        let config = WorkspaceConfig::new(10).with_max_size_bytes(10);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("12 bytes"));
        assert!(WorkspaceConfig::new(10)
            .with_max_size_bytes(12)
            .validate()
            .is_ok());
        assert!(WorkspaceConfig::new(16)
            .with_max_size_bytes(16)
            .validate()
            .is_ok());
    }

    #[test]
    fn zero_percent_overallocation_rejected() {
        let config = WorkspaceConfig::default()
            .with_over_allocation(OverAllocationPolicy::Overallocate { percent: 0 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn growth_segment_respects_policy() {
        let strict = WorkspaceConfig::new(400);
        assert_eq!(strict.growth_segment_elements(10), 100);
        assert_eq!(strict.growth_segment_elements(500), 500);

        let padded = WorkspaceConfig::new(400)
            .with_over_allocation(OverAllocationPolicy::Overallocate { percent: 50 });
        assert_eq!(padded.growth_segment_elements(10), 150);
        assert_eq!(padded.growth_segment_elements(500), 750);
    }
}
