#![allow(clippy::missing_safety_doc)]

use std::ptr;

use prio_arbiter_core::{Arbiter, ArbiterCfg, ArbiterError, GrantState, Rank, SlotInput};

/// FFI ABI version for prio_arbiter_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const PRIO_ARBITER_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn prio_arbiter_ffi_version() -> u32 {
    PRIO_ARBITER_FFI_VERSION
}

// Snapshot wire format identification.
const SNAP_MAGIC: u32 = 0x3152_4150; // "PAR1" little-endian
const SNAP_VERSION: u32 = 1;
const SNAP_LEN: usize = 16;

// Return codes.
pub const PA_OK: i32 = 0;
pub const PA_ERR_ARG: i32 = -1;
pub const PA_ERR_SLOT_COUNT: i32 = -2;
pub const PA_ERR_RANK: i32 = -3;
pub const PA_ERR_CFG: i32 = -4;
pub const PA_ERR_MAGIC: i32 = -8;
pub const PA_ERR_VERSION: i32 = -9;

/// Opaque handle exposed over FFI.
#[repr(C)]
pub struct PrioArbiter {
    inner: Arbiter,
}

/// Construction-time shape.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PaCfg {
    pub slots: u32,
    pub data_width: u32,
}

/// Lines of one requestor slot. Slot `i` of an array is rank `i + 1`.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct PaSlot {
    pub request: u8,
    pub data: u64,
}

/// Per-tick result. Ranks are 1-based; 0 means "none".
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct PaTick {
    pub routed: u64,
    pub granted: u32,
    pub next: u32,
    pub highest_pending: u32,
    pub rc: i32,
}

impl PaTick {
    fn err(rc: i32) -> Self {
        PaTick {
            routed: 0,
            granted: 0,
            next: 0,
            highest_pending: 0,
            rc,
        }
    }
}

/// Owned byte buffer (for snapshot).
#[repr(C)]
pub struct PaBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

fn rc_for(e: ArbiterError) -> i32 {
    match e {
        ArbiterError::NoSlots | ArbiterError::DataWidth { .. } => PA_ERR_CFG,
        ArbiterError::RankOutOfRange { .. } => PA_ERR_RANK,
        ArbiterError::SlotCountMismatch { .. } => PA_ERR_SLOT_COUNT,
    }
}

fn rank_to_ffi(r: Option<Rank>) -> u32 {
    r.map(|r| r.get() as u32).unwrap_or(0)
}

#[no_mangle]
pub extern "C" fn prio_arbiter_cfg_default() -> PaCfg {
    let d = ArbiterCfg::default();
    PaCfg {
        slots: d.slots as u32,
        data_width: d.data_width,
    }
}

/// Create a new arbiter handle in the reset state. Returns null for a degenerate shape.
#[no_mangle]
pub extern "C" fn prio_arbiter_new(cfg: PaCfg) -> *mut PrioArbiter {
    let cfg = ArbiterCfg {
        slots: cfg.slots as usize,
        data_width: cfg.data_width,
    };
    match Arbiter::new(cfg) {
        Ok(inner) => Box::into_raw(Box::new(PrioArbiter { inner })),
        Err(_) => ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_free(h: *mut PrioArbiter) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Run one tick.
///
/// `slots_ptr` must point at `slots_len` slots (one per rank). If `grants_out` is
/// non-null it must have room for `slots_len` bytes; each is set to 1 or 0.
#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_tick(
    h: *mut PrioArbiter,
    reset: u8,
    slots_ptr: *const PaSlot,
    slots_len: usize,
    grants_out: *mut u8,
) -> PaTick {
    if h.is_null() || (slots_ptr.is_null() && slots_len > 0) {
        return PaTick::err(PA_ERR_ARG);
    }
    let handle = &mut *h;

    let lines: Vec<SlotInput> = if slots_len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(slots_ptr, slots_len)
            .iter()
            .map(|s| SlotInput {
                request: s.request != 0,
                data: s.data,
            })
            .collect()
    };

    let out = match handle.inner.tick(reset != 0, &lines) {
        Ok(out) => out,
        Err(e) => return PaTick::err(rc_for(e)),
    };

    if !grants_out.is_null() {
        let dst = std::slice::from_raw_parts_mut(grants_out, slots_len);
        for (d, g) in dst.iter_mut().zip(out.grants.iter()) {
            *d = *g as u8;
        }
    }

    PaTick {
        routed: out.routed,
        granted: rank_to_ffi(out.granted),
        next: rank_to_ffi(out.next),
        highest_pending: rank_to_ffi(out.highest_pending),
        rc: PA_OK,
    }
}

/// Current grant register (0 = none, also returned for a null handle).
#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_granted(h: *const PrioArbiter) -> u32 {
    if h.is_null() {
        return 0;
    }
    rank_to_ffi((*h).inner.granted())
}

/// Snapshot format (binary, little-endian):
/// [u32 magic = "PAR1"][u32 version = 1][u32 slots][u32 granted (0 = none)]
#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_snapshot(h: *const PrioArbiter) -> PaBytes {
    if h.is_null() {
        return PaBytes { ptr: ptr::null_mut(), len: 0 };
    }
    let arb = &(*h).inner;

    let mut buf: Vec<u8> = Vec::with_capacity(SNAP_LEN);
    buf.extend_from_slice(&SNAP_MAGIC.to_le_bytes());
    buf.extend_from_slice(&SNAP_VERSION.to_le_bytes());
    buf.extend_from_slice(&(arb.cfg().slots as u32).to_le_bytes());
    buf.extend_from_slice(&rank_to_ffi(arb.granted()).to_le_bytes());

    let mut boxed = buf.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    let len = boxed.len();
    std::mem::forget(boxed);

    PaBytes { ptr, len }
}

#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_bytes_free(b: PaBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}

/// Load a register saved by `prio_arbiter_snapshot`. The snapshot's slot count
/// must match the handle's shape.
#[no_mangle]
pub unsafe extern "C" fn prio_arbiter_restore(h: *mut PrioArbiter, bytes: *const u8, len: usize) -> i32 {
    if h.is_null() || bytes.is_null() || len < SNAP_LEN {
        return PA_ERR_ARG;
    }
    let handle = &mut *h;
    let data = std::slice::from_raw_parts(bytes, len);

    let read_u32 = |at: usize| -> Option<u32> {
        let b = data.get(at..at + 4)?;
        Some(u32::from_le_bytes(b.try_into().ok()?))
    };

    let (Some(magic), Some(ver), Some(slots), Some(granted)) =
        (read_u32(0), read_u32(4), read_u32(8), read_u32(12))
    else {
        return PA_ERR_ARG;
    };
    if magic != SNAP_MAGIC {
        return PA_ERR_MAGIC;
    }
    if ver != SNAP_VERSION {
        return PA_ERR_VERSION;
    }
    if slots as usize != handle.inner.cfg().slots {
        return PA_ERR_SLOT_COUNT;
    }

    let state = if granted == 0 {
        GrantState::default()
    } else {
        match handle.inner.rank(granted as usize) {
            Ok(r) => GrantState::held(r),
            Err(e) => return rc_for(e),
        }
    };

    match handle.inner.load_state(state) {
        Ok(()) => PA_OK,
        Err(e) => rc_for(e),
    }
}
