use crate::consts::NIL;
use crate::errors::{Error, Result};

/// Allocates `len` empty hash slots, reporting allocation failure instead of
/// aborting.
pub(crate) fn empty_slots(len: usize, table: &'static str) -> Result<Vec<u32>> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(len)
        .map_err(|_| Error::CapacityExhausted {
            table,
            requested: len,
        })?;
    slots.resize(len, NIL);
    Ok(slots)
}

/// Capacity after a rehash: doubled when live entries fill at least half of
/// the current table, unchanged otherwise (only tombstones get dropped).
pub(crate) fn grown_capacity(len: usize, live: usize, table: &'static str) -> Result<usize> {
    if (live + 1) * 2 < len {
        return Ok(len);
    }
    len.checked_mul(2).ok_or(Error::CapacityExhausted {
        table,
        requested: usize::MAX,
    })
}

/// Arena indexes are `u32` with `NIL` (and the tombstone just below it)
/// reserved.
pub(crate) fn check_arena_room(len: usize, table: &'static str) -> Result<()> {
    if len >= (NIL - 1) as usize {
        return Err(Error::CapacityExhausted {
            table,
            requested: len + 1,
        });
    }
    Ok(())
}
