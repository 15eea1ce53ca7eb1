use crate::error::ArbiterError;

/// Widest payload a slot can carry.
pub const MAX_DATA_WIDTH: u32 = u64::BITS;

/// Static shape of one arbiter instance. Fixed for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArbiterCfg {
    /// Number of requestor slots (`N`). Rank 1 is the highest priority.
    pub slots: usize,
    /// Payload width in bits.
    pub data_width: u32,
}

impl Default for ArbiterCfg {
    fn default() -> Self {
        Self {
            slots: 2,
            data_width: 8,
        }
    }
}

impl ArbiterCfg {
    pub fn new(slots: usize, data_width: u32) -> Result<Self, ArbiterError> {
        let cfg = Self { slots, data_width };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.slots == 0 {
            return Err(ArbiterError::NoSlots);
        }
        if self.data_width == 0 || self.data_width > MAX_DATA_WIDTH {
            return Err(ArbiterError::DataWidth { bits: self.data_width });
        }
        Ok(())
    }

    /// All-ones value for the configured width.
    #[inline]
    pub fn data_mask(&self) -> u64 {
        if self.data_width >= MAX_DATA_WIDTH {
            u64::MAX
        } else {
            (1u64 << self.data_width) - 1
        }
    }

    /// Value driven on the output while nobody holds a valid grant.
    #[inline]
    pub fn idle_value(&self) -> u64 {
        0
    }
}
