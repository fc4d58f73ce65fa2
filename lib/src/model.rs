//! Handles to interned values and stored quads.

use std::fmt;

use crate::store::QuadStore;
use crate::term::TermRef;

/// Identity of an interned value: the interning slot plus the store that
/// owns it. Two ids are equal only if they come from the same store and
/// name the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId {
    pub(crate) store: u32,
    pub(crate) slot: u32,
}

impl ValueId {
    /// Position of the value in its store's interning arena.
    pub fn slot(&self) -> u32 {
        self.slot
    }
}

/// A stored quad as four value ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: ValueId,
    pub predicate: ValueId,
    pub object: ValueId,
    pub context: ValueId,
}

/// Interned value together with the store it lives in.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    pub(crate) store: &'a QuadStore,
    pub(crate) slot: u32,
}

impl<'a> ValueRef<'a> {
    pub fn id(&self) -> ValueId {
        ValueId {
            store: self.store.tag,
            slot: self.slot,
        }
    }

    pub fn term(&self) -> TermRef<'a> {
        self.store.values.term(self.slot)
    }

    pub fn is_default_graph(&self) -> bool {
        self.slot == self.store.default_graph
    }

    fn same_store(&self, other: &ValueRef<'_>) -> bool {
        self.store.tag == other.store.tag
    }
}

/// Values of one store are equal when they share a slot; values of two
/// different stores are equal when their content is.
impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.same_store(other) {
            self.slot == other.slot
        } else {
            self.term() == other.term()
        }
    }
}

impl Eq for ValueRef<'_> {}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}@{}", self.term(), self.slot)
    }
}

impl fmt::Display for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.term().fmt(f)
    }
}

/// Quad yielded by a read-only scan.
#[derive(Clone, Copy)]
pub struct QuadRef<'a> {
    pub(crate) store: &'a QuadStore,
    pub(crate) slots: [u32; 4],
}

impl<'a> QuadRef<'a> {
    fn value(&self, column: usize) -> ValueRef<'a> {
        ValueRef {
            store: self.store,
            slot: self.slots[column],
        }
    }

    pub fn subject(&self) -> ValueRef<'a> {
        self.value(0)
    }

    pub fn predicate(&self) -> ValueRef<'a> {
        self.value(1)
    }

    pub fn object(&self) -> ValueRef<'a> {
        self.value(2)
    }

    pub fn context(&self) -> ValueRef<'a> {
        self.value(3)
    }

    pub fn quad(&self) -> Quad {
        Quad {
            subject: self.subject().id(),
            predicate: self.predicate().id(),
            object: self.object().id(),
            context: self.context().id(),
        }
    }
}

impl PartialEq for QuadRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.store.tag == other.store.tag {
            return self.slots == other.slots;
        }
        (0..4).all(|column| self.value(column) == other.value(column))
    }
}

impl Eq for QuadRef<'_> {}

impl fmt::Debug for QuadRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// `(s, p, o)` followed by ` [ctx]` unless the quad is in the default graph.
impl fmt::Display for QuadRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.subject(),
            self.predicate(),
            self.object()
        )?;
        let context = self.context();
        if !context.is_default_graph() {
            write!(f, " [{}]", context)?;
        }
        Ok(())
    }
}
