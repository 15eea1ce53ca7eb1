//! Sharded bank of arbiter channels.
//!
//! Each channel is an independent arbiter: its own shape, grant register and
//! latched request lines. The supervisor:
//! - routes request events to the right channel latch
//! - ticks every open channel once per `tick()` call
//! - exports and restores grant registers as plain data
//!
//! No IO. No async. Concurrency is achieved by sharding channels by `channel_id`.

use std::collections::HashMap;

use prio_arbiter_core::{arbiter_tick, ArbiterCfg, ArbiterError, GrantState, Rank, TickOutputs};

use crate::adapter::{LineLatch, RequestEvent};

/// Result of one tick on one channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickAction {
    pub channel_id: String,
    /// Reset input as sampled for this tick.
    pub reset: bool,
    pub outputs: TickOutputs,
}

impl TickAction {
    /// True when the channel's grant register changes at this tick's boundary.
    pub fn changed(&self) -> bool {
        self.outputs.changed()
    }
}

/// Snapshot of every channel's grant register.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SupervisorSnapshot {
    pub states: Vec<(String, GrantState)>,
}

/// Counters returned by restore operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RestoreStats {
    /// Channel registers applied from the snapshot.
    pub applied: usize,
    /// Existing channel registers that were overwritten.
    pub overwritten: usize,
    /// Entries whose rank does not fit the channel's shape.
    pub rejected: usize,
}

/// Counters returned by `apply`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub applied: usize,
    /// Events for unknown channels or out-of-range ranks.
    pub rejected: usize,
}

#[derive(Debug)]
struct Channel {
    cfg: ArbiterCfg,
    latch: LineLatch,
    state: GrantState,
}

impl Channel {
    fn new(cfg: ArbiterCfg) -> Self {
        Self {
            latch: LineLatch::new(&cfg),
            state: GrantState::default(),
            cfg,
        }
    }
}

#[derive(Default, Debug)]
struct Shard {
    channels: HashMap<String, Channel>,
}

/// Deterministic FNV-1a hash (stable across runs).
fn fnv1a_u64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325;
    for b in s.as_bytes() {
        h ^= *b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

fn shard_index(channel_id: &str, shard_count: usize) -> usize {
    if shard_count <= 1 {
        return 0;
    }
    (fnv1a_u64(channel_id) as usize) % shard_count
}

/// A sharded bank of arbiters, one per `channel_id`.
#[derive(Debug)]
pub struct ArbiterSupervisor {
    cfg: ArbiterCfg,
    /// Per-channel shape overrides, used when a channel is opened or restored.
    cfg_overrides: HashMap<String, ArbiterCfg>,
    shards: usize,
    // NOTE: the supervisor never spawns threads; the mutexes only let callers share it.
    state_shards: Vec<std::sync::Mutex<Shard>>,
}

impl ArbiterSupervisor {
    /// Create a supervisor with `shards` state shards. `shards=1` behaves single-threaded.
    pub fn new(shards: usize, cfg: ArbiterCfg) -> Result<Self, ArbiterError> {
        cfg.validate()?;
        let shards = shards.max(1);
        let mut state_shards = Vec::with_capacity(shards);
        for _ in 0..shards {
            state_shards.push(std::sync::Mutex::new(Shard::default()));
        }

        Ok(Self {
            cfg,
            cfg_overrides: HashMap::new(),
            shards,
            state_shards,
        })
    }

    /// Override the shape of a specific channel. Takes effect the next time it is opened.
    pub fn set_cfg_override(&mut self, channel_id: impl Into<String>, cfg: ArbiterCfg) -> Result<(), ArbiterError> {
        cfg.validate()?;
        self.cfg_overrides.insert(channel_id.into(), cfg);
        Ok(())
    }

    pub fn clear_cfg_override(&mut self, channel_id: &str) {
        self.cfg_overrides.remove(channel_id);
    }

    fn cfg_for(&self, channel_id: &str) -> &ArbiterCfg {
        self.cfg_overrides.get(channel_id).unwrap_or(&self.cfg)
    }

    fn shard(&self, channel_id: &str) -> std::sync::MutexGuard<'_, Shard> {
        let idx = shard_index(channel_id, self.shards);
        self.state_shards[idx]
            .lock()
            .expect("arbiter supervisor shard mutex poisoned")
    }

    /// Open a channel in the reset state. Returns false if it was already open.
    pub fn open_channel(&self, channel_id: &str) -> bool {
        let cfg = *self.cfg_for(channel_id);
        let mut guard = self.shard(channel_id);
        if guard.channels.contains_key(channel_id) {
            return false;
        }
        log::debug!("opening channel {} with {} slots", channel_id, cfg.slots);
        guard.channels.insert(channel_id.to_string(), Channel::new(cfg));
        true
    }

    /// Close a channel, dropping its register and latched lines.
    pub fn close_channel(&self, channel_id: &str) -> bool {
        self.shard(channel_id).channels.remove(channel_id).is_some()
    }

    /// Open channel ids, sorted.
    pub fn channel_ids(&self) -> Vec<String> {
        let mut out = Vec::new();
        for shard in &self.state_shards {
            let guard = shard
                .lock()
                .expect("arbiter supervisor shard mutex poisoned");
            out.extend(guard.channels.keys().cloned());
        }
        out.sort();
        out
    }

    /// Shape of an open channel.
    pub fn channel_cfg(&self, channel_id: &str) -> Option<ArbiterCfg> {
        self.shard(channel_id).channels.get(channel_id).map(|c| c.cfg)
    }

    /// Current grant register of a channel; `None` if the channel is not open.
    pub fn granted(&self, channel_id: &str) -> Option<Option<Rank>> {
        self.shard(channel_id)
            .channels
            .get(channel_id)
            .map(|c| c.state.granted())
    }

    /// Latch request events. Lines keep their level until the next event touches them.
    pub fn apply(&self, events: &[RequestEvent<'_>]) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for ev in events {
            let mut guard = self.shard(&ev.channel_id);
            let Some(channel) = guard.channels.get_mut(&*ev.channel_id) else {
                log::warn!("dropping event for unknown channel {}", ev.channel_id);
                stats.rejected += 1;
                continue;
            };
            match channel.latch.apply(ev.kind) {
                Ok(()) => stats.applied += 1,
                Err(e) => {
                    log::warn!("dropping event for channel {}: {}", ev.channel_id, e);
                    stats.rejected += 1;
                }
            }
        }
        stats
    }

    /// Run one tick on every open channel.
    ///
    /// Deterministic: channels are visited in sorted order within each shard and
    /// the returned actions are sorted by `channel_id`.
    pub fn tick(&self) -> Vec<TickAction> {
        let mut out = Vec::new();

        for shard in &self.state_shards {
            let mut guard = shard
                .lock()
                .expect("arbiter supervisor shard mutex poisoned");

            let mut ids: Vec<String> = guard.channels.keys().cloned().collect();
            ids.sort();

            for channel_id in ids {
                let Some(channel) = guard.channels.get_mut(&channel_id) else {
                    continue;
                };
                let registry = match channel.latch.sample(&channel.cfg) {
                    Ok(r) => r,
                    Err(e) => {
                        log::error!("channel {} latch does not match its shape: {}", channel_id, e);
                        continue;
                    }
                };
                let reset = channel.latch.reset_active();
                let outputs = arbiter_tick(reset, &registry, &mut channel.state);
                out.push(TickAction {
                    channel_id,
                    reset,
                    outputs,
                });
            }
        }

        out.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        out
    }

    /// Latch `events`, then tick every open channel.
    pub fn ingest(&self, events: &[RequestEvent<'_>]) -> Vec<TickAction> {
        let stats = self.apply(events);
        if stats.rejected > 0 {
            log::warn!("{} of {} events rejected", stats.rejected, events.len());
        }
        self.tick()
    }

    /// Export every channel's grant register, sorted by `channel_id`.
    pub fn snapshot(&self) -> SupervisorSnapshot {
        self.snapshot_filtered(|_, _| true)
    }

    /// Export the registers of channels accepted by `predicate`, sorted by `channel_id`.
    pub fn snapshot_filtered<F>(&self, mut predicate: F) -> SupervisorSnapshot
    where
        F: FnMut(&str, &GrantState) -> bool,
    {
        let mut out: Vec<(String, GrantState)> = Vec::new();

        // Lock shards in a stable order.
        for shard in &self.state_shards {
            let guard = shard
                .lock()
                .expect("arbiter supervisor shard mutex poisoned");
            for (k, c) in guard.channels.iter() {
                if predicate(k.as_str(), &c.state) {
                    out.push((k.clone(), c.state));
                }
            }
        }

        out.sort_by(|a, b| a.0.cmp(&b.0));
        SupervisorSnapshot { states: out }
    }

    /// Replace every channel with the ones in `snap`. Restored channels start with quiet lines.
    pub fn restore(&self, snap: SupervisorSnapshot) -> RestoreStats {
        for shard in &self.state_shards {
            let mut guard = shard
                .lock()
                .expect("arbiter supervisor shard mutex poisoned");
            guard.channels.clear();
        }
        self.restore_merge(snap)
    }

    /// Merge `snap` into the current channels.
    ///
    /// Existing channels keep their latched lines; only their grant register is overwritten.
    pub fn restore_merge(&self, snap: SupervisorSnapshot) -> RestoreStats {
        let mut stats = RestoreStats::default();
        for (channel_id, state) in snap.states {
            let cfg = *self.cfg_for(&channel_id);
            let mut guard = self.shard(&channel_id);
            let existing_cfg = guard.channels.get(&channel_id).map(|c| c.cfg).unwrap_or(cfg);

            if let Err(e) = state.check(&existing_cfg) {
                log::warn!("rejecting snapshot entry for channel {}: {}", channel_id, e);
                stats.rejected += 1;
                continue;
            }

            match guard.channels.get_mut(&channel_id) {
                Some(channel) => {
                    channel.state = state;
                    stats.overwritten += 1;
                }
                None => {
                    let mut channel = Channel::new(cfg);
                    channel.state = state;
                    guard.channels.insert(channel_id, channel);
                }
            }
            stats.applied += 1;
        }
        stats
    }
}
