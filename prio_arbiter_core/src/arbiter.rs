use crate::{
    cfg::ArbiterCfg,
    error::ArbiterError,
    registry::{Rank, RequestRegistry, SlotInput},
    state::GrantState,
    tick::{arbiter_tick, TickOutputs},
};

/// A constructed arbiter: fixed shape plus its grant register.
#[derive(Clone, Debug)]
pub struct Arbiter {
    cfg: ArbiterCfg,
    state: GrantState,
    ticks: u64,
}

impl Arbiter {
    /// Build an arbiter in the reset state. Refuses degenerate shapes.
    pub fn new(cfg: ArbiterCfg) -> Result<Self, ArbiterError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            state: GrantState::default(),
            ticks: 0,
        })
    }

    pub fn cfg(&self) -> &ArbiterCfg {
        &self.cfg
    }

    pub fn state(&self) -> GrantState {
        self.state
    }

    #[inline]
    pub fn granted(&self) -> Option<Rank> {
        self.state.granted()
    }

    /// Number of ticks run since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Checked rank for this arbiter's shape.
    pub fn rank(&self, rank: usize) -> Result<Rank, ArbiterError> {
        Rank::new(rank, self.cfg.slots)
    }

    /// Sample `lines` and run one tick.
    pub fn tick(&mut self, reset: bool, lines: &[SlotInput]) -> Result<TickOutputs, ArbiterError> {
        let registry = RequestRegistry::sample(&self.cfg, lines)?;
        Ok(self.run(reset, &registry))
    }

    /// Run one tick against an already-sampled registry.
    pub fn tick_registry(&mut self, reset: bool, registry: &RequestRegistry) -> Result<TickOutputs, ArbiterError> {
        if registry.len() != self.cfg.slots {
            return Err(ArbiterError::SlotCountMismatch {
                expected: self.cfg.slots,
                got: registry.len(),
            });
        }
        Ok(self.run(reset, registry))
    }

    /// Replace the grant register, e.g. from a saved snapshot.
    pub fn load_state(&mut self, state: GrantState) -> Result<(), ArbiterError> {
        state.check(&self.cfg)?;
        self.state = state;
        Ok(())
    }

    fn run(&mut self, reset: bool, registry: &RequestRegistry) -> TickOutputs {
        self.ticks += 1;
        arbiter_tick(reset, registry, &mut self.state)
    }
}
