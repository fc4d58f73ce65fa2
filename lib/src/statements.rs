//! Statement table and column chains.
//!
//! Statement records live in an arena (`records`) and are addressed by
//! `u32` handles. `slots` is an open-addressed hash set over the identity of
//! the four value slots of a record, with linear probing and real tombstones
//! since statements are removed one at a time.
//!
//! Every live record is also threaded into four doubly linked lists, one per
//! column. The head and length of each list sit on the value that occupies
//! that column (`values::Chain`), so the list for (column, value) holds
//! exactly the live statements with that value in that column.

use log::{debug, trace};

use crate::consts::NIL;
use crate::errors::{Error, Result};
use crate::util::{check_arena_room, empty_slots, grown_capacity};
use crate::values::ValueTable;

const TOMBSTONE: u32 = NIL - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Link {
    prev: u32,
    next: u32,
}

impl Link {
    const NONE: Link = Link {
        prev: NIL,
        next: NIL,
    };
}

#[derive(Debug, Clone)]
struct Record {
    quad: [u32; 4],
    links: [Link; 4],
}

#[derive(Debug)]
pub(crate) struct StatementTable {
    records: Vec<Record>,
    // arena slots of removed records, reused by later inserts
    free: Vec<u32>,
    slots: Vec<u32>,
    // non-empty slots, tombstones included
    occupied: usize,
    count: usize,
    initial_capacity: usize,
}

fn hash_quad(quad: &[u32; 4]) -> usize {
    let h = (quad[0] as u64)
        .wrapping_mul(6661)
        .wrapping_add((quad[1] as u64).wrapping_mul(961))
        .wrapping_add((quad[2] as u64).wrapping_mul(31))
        .wrapping_add(quad[3] as u64);
    let h = h.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    (h ^ (h >> 32)) as usize
}

impl StatementTable {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= 8);
        StatementTable {
            records: Vec::new(),
            free: Vec::new(),
            slots: vec![NIL; capacity],
            occupied: 0,
            count: 0,
            initial_capacity: capacity,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Record stored in hash slot `slot`, if the slot is live.
    #[inline]
    pub(crate) fn live_record(&self, slot: usize) -> Option<u32> {
        match self.slots[slot] {
            NIL | TOMBSTONE => None,
            idx => Some(idx),
        }
    }

    #[inline]
    pub(crate) fn quad(&self, record: u32) -> &[u32; 4] {
        &self.records[record as usize].quad
    }

    #[inline]
    pub(crate) fn next_in_chain(&self, record: u32, column: usize) -> u32 {
        self.records[record as usize].links[column].next
    }

    /// Hash slot holding `quad`, if present.
    fn find(&self, quad: &[u32; 4]) -> Option<usize> {
        let mask = self.slots.len() - 1;
        let mut slot = hash_quad(quad) & mask;
        loop {
            match self.slots[slot] {
                NIL => return None,
                TOMBSTONE => {}
                idx if self.records[idx as usize].quad == *quad => return Some(slot),
                _ => {}
            }
            slot = (slot + 1) & mask;
        }
    }

    pub(crate) fn contains(&self, quad: &[u32; 4]) -> bool {
        self.find(quad).is_some()
    }

    /// Adds `quad` unless an identical one is stored. Returns whether the
    /// table changed. On error nothing has been modified.
    pub(crate) fn insert(&mut self, values: &mut ValueTable, quad: [u32; 4]) -> Result<bool> {
        if (self.occupied + 1) * 2 >= self.slots.len() {
            self.rehash()?;
        }

        // probe up to an empty slot so a duplicate behind a tombstone is found
        let mask = self.slots.len() - 1;
        let mut slot = hash_quad(&quad) & mask;
        let mut reusable = None;
        loop {
            match self.slots[slot] {
                NIL => break,
                TOMBSTONE => {
                    reusable.get_or_insert(slot);
                }
                idx if self.records[idx as usize].quad == quad => return Ok(false),
                _ => {}
            }
            slot = (slot + 1) & mask;
        }

        let record = self.allocate(quad)?;
        match reusable {
            Some(tombstone) => self.slots[tombstone] = record,
            None => {
                self.slots[slot] = record;
                self.occupied += 1;
            }
        }

        // splice at the head of each column chain
        for column in 0..4 {
            let chain = values.chain_mut(quad[column], column);
            let head = chain.head;
            chain.head = record;
            chain.count += 1;
            self.records[record as usize].links[column].next = head;
            if head != NIL {
                self.records[head as usize].links[column].prev = record;
            }
        }
        self.count += 1;
        trace!("added statement {:?} as record {}", quad, record);
        Ok(true)
    }

    fn allocate(&mut self, quad: [u32; 4]) -> Result<u32> {
        let record = Record {
            quad,
            links: [Link::NONE; 4],
        };
        if let Some(idx) = self.free.pop() {
            self.records[idx as usize] = record;
            return Ok(idx);
        }
        check_arena_room(self.records.len(), "statement")?;
        self.records
            .try_reserve(1)
            .map_err(|_| Error::CapacityExhausted {
                table: "statement",
                requested: self.records.len() + 1,
            })?;
        self.records.push(record);
        Ok((self.records.len() - 1) as u32)
    }

    /// Removes `quad` if stored. Returns whether the table changed.
    pub(crate) fn remove(&mut self, values: &mut ValueTable, quad: &[u32; 4]) -> bool {
        let Some(slot) = self.find(quad) else {
            return false;
        };
        let record = self.slots[slot];
        self.slots[slot] = TOMBSTONE;
        self.unlink(values, record);
        self.count -= 1;
        self.free.push(record);
        trace!("removed statement {:?} (record {})", quad, record);
        true
    }

    fn unlink(&mut self, values: &mut ValueTable, record: u32) {
        let Record { quad, links } = self.records[record as usize].clone();
        for column in 0..4 {
            let Link { prev, next } = links[column];
            if prev != NIL {
                self.records[prev as usize].links[column].next = next;
            } else {
                let chain = values.chain_mut(quad[column], column);
                debug_assert_eq!(chain.head, record, "record is not its chain head");
                chain.head = next;
            }
            if next != NIL {
                self.records[next as usize].links[column].prev = prev;
            }
            let chain = values.chain_mut(quad[column], column);
            debug_assert!(chain.count > 0, "chain count underflow");
            chain.count -= 1;
        }
        self.records[record as usize].links = [Link::NONE; 4];
    }

    /// Drops every statement and resets all chains, keeping the values.
    /// Returns whether anything was removed.
    pub(crate) fn clear(&mut self, values: &mut ValueTable) -> bool {
        if self.count == 0 {
            return false;
        }
        debug!(
            "clearing statement table: {} statements, {} slots",
            self.count,
            self.slots.len()
        );
        self.slots = vec![NIL; self.initial_capacity];
        self.records.clear();
        self.free.clear();
        self.occupied = 0;
        self.count = 0;
        values.reset_chains();
        true
    }

    fn rehash(&mut self) -> Result<()> {
        let len = grown_capacity(self.slots.len(), self.count, "statement")?;
        debug!(
            "rehashing statement table: {} statements, {} used slots, {} -> {} slots",
            self.count,
            self.occupied,
            self.slots.len(),
            len
        );
        let mut slots = empty_slots(len, "statement")?;
        let mask = len - 1;
        for &idx in &self.slots {
            if idx == NIL || idx == TOMBSTONE {
                continue;
            }
            let mut slot = hash_quad(&self.records[idx as usize].quad) & mask;
            while slots[slot] != NIL {
                slot = (slot + 1) & mask;
            }
            slots[slot] = idx;
        }
        self.slots = slots;
        self.occupied = self.count;
        Ok(())
    }

    /// Walks every chain and table slot, checking that links, counters and
    /// table membership agree.
    pub(crate) fn check(&self, values: &ValueTable) -> Result<()> {
        let corrupt = |msg: String| Err(Error::Corrupt(msg));

        let mut live = 0usize;
        for slot in 0..self.slots.len() {
            if let Some(idx) = self.live_record(slot) {
                live += 1;
                if self.find(self.quad(idx)) != Some(slot) {
                    return corrupt(format!("record {} unreachable from its hash", idx));
                }
            }
        }
        if live != self.count {
            return corrupt(format!("{} live slots but count is {}", live, self.count));
        }

        for column in 0..4 {
            let mut total = 0usize;
            for value in 0..values.len() as u32 {
                let chain = values.chain(value, column);
                let mut prev = NIL;
                let mut cursor = chain.head;
                let mut length = 0u32;
                while cursor != NIL {
                    let record = &self.records[cursor as usize];
                    if record.quad[column] != value {
                        return corrupt(format!(
                            "record {} on chain of value {} column {}",
                            cursor, value, column
                        ));
                    }
                    if record.links[column].prev != prev {
                        return corrupt(format!("record {} has a stale back link", cursor));
                    }
                    if self.find(&record.quad).is_none() {
                        return corrupt(format!("record {} chained but not stored", cursor));
                    }
                    length += 1;
                    prev = cursor;
                    cursor = record.links[column].next;
                }
                if length != chain.count {
                    return corrupt(format!(
                        "value {} column {}: chain length {} but count {}",
                        value, column, length, chain.count
                    ));
                }
                total += length as usize;
            }
            if total != self.count {
                return corrupt(format!(
                    "column {} chains hold {} statements, expected {}",
                    column, total, self.count
                ));
            }
        }
        Ok(())
    }
}
