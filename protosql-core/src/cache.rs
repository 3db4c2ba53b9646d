//! Single-slot decode cache.
//!
//! SQL workloads call the extraction functions many times per row with the
//! same message bytes; re-decoding on every call dominates the cost. The
//! cache keeps the most recent decode: an owned copy of the message plus
//! the offset-based tree built from it, in lockstep so the tree can never
//! refer to bytes that were overwritten. Slots are thread-local, which
//! makes concurrent host access safe without locking.
//!
//! A hit is served by re-basing the cached tree onto the caller's buffer
//! ([`OwnedField::view`]), so returned slices always point into the bytes
//! the caller passed in, never into the cache's copy.

use std::cell::RefCell;

use crate::decode::decode;
use crate::field::{Field, OwnedField};

/// Largest message the slot will hold. Bigger inputs invalidate the slot
/// and decode uncached.
pub const DECODE_CACHE_WINDOW: usize = 4096;

/// Per-thread hit/miss counters for the decode slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls served from the slot.
    pub hits: u64,
    /// Calls that decoded and refilled the slot.
    pub misses: u64,
    /// Calls whose input exceeded the window and decoded uncached.
    pub bypasses: u64,
}

#[derive(Default)]
struct Slot {
    bytes: Vec<u8>,
    packed: bool,
    tree: Option<OwnedField>,
    stats: CacheStats,
}

thread_local! {
    static DECODE_SLOT: RefCell<Slot> = RefCell::new(Slot::default());
}

/// Decode `input`, reusing this thread's cached tree when the bytes and
/// the `packed` flag match the previous call.
///
/// Indistinguishable from [`decode`] except for speed: the returned tree
/// always borrows from `input`.
pub fn decode_cached<'a>(input: &'a [u8], packed: bool) -> Field<'a> {
    DECODE_SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        let slot = &mut *slot;

        if input.len() > DECODE_CACHE_WINDOW {
            slot.tree = None;
            slot.bytes.clear();
            slot.stats.bypasses += 1;
            return decode(input, packed);
        }

        if let Some(tree) = &slot.tree {
            if slot.packed == packed && slot.bytes == input {
                slot.stats.hits += 1;
                return tree.view(input);
            }
        }

        slot.stats.misses += 1;
        let tree = decode(input, packed);
        slot.bytes.clear();
        slot.bytes.extend_from_slice(input);
        slot.packed = packed;
        slot.tree = Some(tree.to_owned_tree(input));
        tree
    })
}

/// This thread's cache counters.
pub fn cache_stats() -> CacheStats {
    DECODE_SLOT.with(|slot| slot.borrow().stats.clone())
}

/// Drop this thread's cached tree and reset the counters.
pub fn reset_cache() {
    DECODE_SLOT.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = Slot::default();
    });
}
