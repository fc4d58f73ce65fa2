//! Value interning table.
//!
//! Every distinct IRI, blank node and literal of a store lives exactly once
//! in `entries`; its index there is its identity. `slots` is an
//! open-addressed, linearly probed hash set over the content hash pointing
//! into `entries`. Values are never removed one by one, so the set has no
//! tombstones and the number of occupied slots always equals the number of
//! entries.
//!
//! Each entry also anchors the four column chains of the statement table
//! (see `statements.rs`).

use hashbrown::{DefaultHashBuilder, HashMap};
use log::debug;
use std::hash::{BuildHasher, Hasher};

use crate::consts::NIL;
use crate::errors::{Error, Result};
use crate::term::{Column, TermRef};
use crate::util::{check_arena_room, empty_slots, grown_capacity};

/// Head and live length of one column chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chain {
    pub(crate) head: u32,
    pub(crate) count: u32,
}

impl Chain {
    pub(crate) const EMPTY: Chain = Chain {
        head: NIL,
        count: 0,
    };
}

#[derive(Debug)]
enum Payload {
    Iri(Box<str>),
    BlankNode(Box<str>),
    Literal {
        label: Box<str>,
        // index into `ValueTable::languages`
        language: Option<u32>,
        // slot of the datatype IRI
        datatype: u32,
    },
}

#[derive(Debug)]
struct ValueEntry {
    payload: Payload,
    hash: u64,
    chains: [Chain; 4],
}

#[derive(Debug)]
pub(crate) struct ValueTable {
    hasher: DefaultHashBuilder,
    entries: Vec<ValueEntry>,
    slots: Vec<u32>,
    // lower-cased language tags, shared by every literal using them
    languages: Vec<Box<str>>,
    language_ids: HashMap<Box<str>, u32>,
}

impl ValueTable {
    /// Creates a table of `capacity` slots (a power of two of at least 8)
    /// already holding `seed`, which gets slot 0.
    pub(crate) fn new(capacity: usize, seed: &str) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= 8);
        let mut table = ValueTable {
            hasher: DefaultHashBuilder::default(),
            entries: Vec::new(),
            slots: vec![NIL; capacity],
            languages: Vec::new(),
            language_ids: HashMap::new(),
        };
        let hash = table.hash_content(TermRef::Iri(seed));
        let slot = table.free_slot(hash);
        table.slots[slot] = 0;
        table.entries.push(ValueEntry {
            payload: Payload::Iri(seed.into()),
            hash,
            chains: [Chain::EMPTY; 4],
        });
        table
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn hash_content(&self, term: TermRef<'_>) -> u64 {
        let mut h = self.hasher.build_hasher();
        match term {
            TermRef::Iri(iri) => {
                h.write_u8(0);
                h.write(iri.as_bytes());
            }
            TermRef::BlankNode(id) => {
                h.write_u8(1);
                h.write(id.as_bytes());
            }
            TermRef::Literal {
                label, language, ..
            } => {
                // 0xff never occurs in UTF-8, so it cleanly separates the parts
                h.write_u8(2);
                h.write(label.as_bytes());
                h.write_u8(0xff);
                if let Some(lang) = language {
                    for b in lang.bytes() {
                        h.write_u8(b.to_ascii_lowercase());
                    }
                }
                h.write_u8(0xff);
                h.write(term.effective_datatype().unwrap_or_default().as_bytes());
            }
        }
        h.finish()
    }

    fn iri_str(&self, slot: u32) -> &str {
        match &self.entries[slot as usize].payload {
            Payload::Iri(iri) => iri,
            _ => unreachable!("slot {} is not an IRI", slot),
        }
    }

    fn entry_matches(&self, entry: &ValueEntry, term: TermRef<'_>) -> bool {
        match (&entry.payload, term) {
            (Payload::Iri(a), TermRef::Iri(b)) => &**a == b,
            (Payload::BlankNode(a), TermRef::BlankNode(b)) => &**a == b,
            (
                Payload::Literal {
                    label,
                    language,
                    datatype,
                },
                TermRef::Literal {
                    label: other_label,
                    language: other_language,
                    ..
                },
            ) => {
                let same_language = match (language, other_language) {
                    (Some(id), Some(tag)) => self.languages[*id as usize].eq_ignore_ascii_case(tag),
                    (None, None) => true,
                    _ => false,
                };
                &**label == other_label
                    && same_language
                    && term.effective_datatype() == Some(self.iri_str(*datatype))
            }
            _ => false,
        }
    }

    /// First empty slot on the probe sequence of `hash`.
    fn free_slot(&self, hash: u64) -> usize {
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;
        while self.slots[slot] != NIL {
            slot = (slot + 1) & mask;
        }
        slot
    }

    /// Canonical slot for `term`, if it was interned.
    pub(crate) fn lookup(&self, term: TermRef<'_>) -> Option<u32> {
        let hash = self.hash_content(term);
        let mask = self.slots.len() - 1;
        let mut slot = hash as usize & mask;
        loop {
            let idx = self.slots[slot];
            if idx == NIL {
                return None;
            }
            let entry = &self.entries[idx as usize];
            if entry.hash == hash && self.entry_matches(entry, term) {
                return Some(idx);
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Canonical slot for `term`, interning it (and a literal's datatype)
    /// when missing.
    pub(crate) fn intern(&mut self, term: TermRef<'_>) -> Result<u32> {
        if let Some(idx) = self.lookup(term) {
            return Ok(idx);
        }
        let payload = match term {
            TermRef::Iri(iri) => Payload::Iri(iri.into()),
            TermRef::BlankNode(id) => Payload::BlankNode(id.into()),
            TermRef::Literal {
                label, language, ..
            } => {
                let datatype = self.intern(TermRef::Iri(
                    term.effective_datatype().unwrap_or_default(),
                ))?;
                let language = match language {
                    Some(tag) => Some(self.intern_language(tag)?),
                    None => None,
                };
                Payload::Literal {
                    label: label.into(),
                    language,
                    datatype,
                }
            }
        };
        let hash = self.hash_content(term);
        self.insert(payload, hash)
    }

    fn intern_language(&mut self, tag: &str) -> Result<u32> {
        let canonical = tag.to_ascii_lowercase();
        if let Some(&id) = self.language_ids.get(canonical.as_str()) {
            return Ok(id);
        }
        check_arena_room(self.languages.len(), "language")?;
        let id = self.languages.len() as u32;
        let canonical: Box<str> = canonical.into();
        self.languages.push(canonical.clone());
        self.language_ids.insert(canonical, id);
        Ok(id)
    }

    fn insert(&mut self, payload: Payload, hash: u64) -> Result<u32> {
        if (self.entries.len() + 1) * 2 >= self.slots.len() {
            self.rehash()?;
        }
        check_arena_room(self.entries.len(), "value")?;
        self.entries
            .try_reserve(1)
            .map_err(|_| Error::CapacityExhausted {
                table: "value",
                requested: self.entries.len() + 1,
            })?;
        let idx = self.entries.len() as u32;
        self.entries.push(ValueEntry {
            payload,
            hash,
            chains: [Chain::EMPTY; 4],
        });
        let slot = self.free_slot(hash);
        self.slots[slot] = idx;
        Ok(idx)
    }

    fn rehash(&mut self) -> Result<()> {
        let len = grown_capacity(self.capacity(), self.entries.len(), "value")?;
        debug!(
            "rehashing value table: {} values, {} -> {} slots",
            self.entries.len(),
            self.capacity(),
            len
        );
        self.slots = empty_slots(len, "value")?;
        for idx in 0..self.entries.len() {
            let slot = self.free_slot(self.entries[idx].hash);
            self.slots[slot] = idx as u32;
        }
        Ok(())
    }

    pub(crate) fn term(&self, slot: u32) -> TermRef<'_> {
        match &self.entries[slot as usize].payload {
            Payload::Iri(iri) => TermRef::Iri(iri),
            Payload::BlankNode(id) => TermRef::BlankNode(id),
            Payload::Literal {
                label,
                language,
                datatype,
            } => TermRef::Literal {
                label,
                language: language.map(|id| &*self.languages[id as usize]),
                datatype: Some(self.iri_str(*datatype)),
            },
        }
    }

    pub(crate) fn accepts(&self, slot: u32, column: Column) -> bool {
        column.accepts(self.term(slot))
    }

    #[inline]
    pub(crate) fn chain(&self, slot: u32, column: usize) -> Chain {
        self.entries[slot as usize].chains[column]
    }

    #[inline]
    pub(crate) fn chain_mut(&mut self, slot: u32, column: usize) -> &mut Chain {
        &mut self.entries[slot as usize].chains[column]
    }

    /// Empties every chain, keeping the values themselves.
    pub(crate) fn reset_chains(&mut self) {
        for entry in &mut self.entries {
            entry.chains = [Chain::EMPTY; 4];
        }
    }
}
