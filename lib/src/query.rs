//! Pattern query engine.
//!
//! A pattern is resolved into a [`Plan`]: the interned slots of its bound
//! subject, predicate and object plus one entry per context to scan (`None`
//! meaning any context). Each entry becomes a [`Bound`] quad, and for each
//! bound quad the engine walks the chain of the bound value with the fewest
//! live statements, filtering on the other bound columns. A quad with no
//! bound column is answered from the statement table itself.

use crate::consts::NIL;
use crate::model::{Quad, QuadRef};
use crate::statements::StatementTable;
use crate::store::QuadStore;
use crate::term::Column;
use crate::values::ValueTable;

/// Resolved pattern. Absent contexts are already dropped, so an empty
/// `contexts` list matches nothing.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
    pub(crate) spo: [Option<u32>; 3],
    pub(crate) contexts: Vec<Option<u32>>,
}

impl Plan {
    pub(crate) fn bounds(&self) -> impl Iterator<Item = Bound> + '_ {
        self.contexts
            .iter()
            .map(|&context| Bound::new(self.spo, context))
    }
}

/// Quad pattern over value slots; `None` is a wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bound([Option<u32>; 4]);

impl Bound {
    pub(crate) fn new(spo: [Option<u32>; 3], context: Option<u32>) -> Self {
        Bound([spo[0], spo[1], spo[2], context])
    }

    #[inline]
    pub(crate) fn matches(&self, quad: &[u32; 4]) -> bool {
        self.0
            .iter()
            .zip(quad)
            .all(|(bound, value)| bound.map_or(true, |b| b == *value))
    }

    /// The quad itself when every column is bound.
    pub(crate) fn complete(&self) -> Option<[u32; 4]> {
        Some([self.0[0]?, self.0[1]?, self.0[2]?, self.0[3]?])
    }

    /// Bound column whose value has the fewest live statements in that
    /// column, with ties going to the earlier column. `None` when nothing
    /// is bound.
    pub(crate) fn select_column(&self, values: &ValueTable) -> Option<(usize, u32)> {
        let mut best: Option<(usize, u32, u32)> = None;
        for column in Column::ALL {
            let column = column.index();
            if let Some(value) = self.0[column] {
                let count = values.chain(value, column).count;
                if best.map_or(true, |(_, _, min)| count < min) {
                    best = Some((column, value, count));
                }
            }
        }
        best.map(|(column, value, _)| (column, value))
    }

    fn bound_columns(&self) -> usize {
        self.0.iter().filter(|b| b.is_some()).count()
    }
}

/// Number of live statements matching `bound`.
pub(crate) fn count_matches(bound: Bound, values: &ValueTable, table: &StatementTable) -> usize {
    let Some((column, value)) = bound.select_column(values) else {
        return table.len();
    };
    let chain = values.chain(value, column);
    if bound.bound_columns() == 1 {
        return chain.count as usize;
    }
    let mut count = 0;
    let mut cursor = chain.head;
    while cursor != NIL {
        if bound.matches(table.quad(cursor)) {
            count += 1;
        }
        cursor = table.next_in_chain(cursor, column);
    }
    count
}

/// Whether any live statement matches `bound`.
pub(crate) fn any_match(bound: Bound, values: &ValueTable, table: &StatementTable) -> bool {
    let Some((column, value)) = bound.select_column(values) else {
        return table.len() > 0;
    };
    let mut cursor = values.chain(value, column).head;
    while cursor != NIL {
        if bound.matches(table.quad(cursor)) {
            return true;
        }
        cursor = table.next_in_chain(cursor, column);
    }
    false
}

#[derive(Debug, Clone, Copy)]
enum Scan {
    // take the next context from the plan
    Pending,
    Table { pos: usize },
    Chain { column: usize, next: u32 },
}

/// Resumable position of a scan over one or more bound quads.
///
/// The cursor always steps past a record before handing it out, so the
/// caller may remove the record it was just given without disturbing the
/// rest of the scan.
#[derive(Debug)]
pub(crate) struct Cursor {
    spo: [Option<u32>; 3],
    contexts: std::vec::IntoIter<Option<u32>>,
    bound: Bound,
    scan: Scan,
}

impl Cursor {
    pub(crate) fn new(plan: Option<Plan>) -> Self {
        let (spo, contexts) = match plan {
            Some(plan) => (plan.spo, plan.contexts),
            None => ([None; 3], Vec::new()),
        };
        Cursor {
            spo,
            contexts: contexts.into_iter(),
            bound: Bound([None; 4]),
            scan: Scan::Pending,
        }
    }

    pub(crate) fn advance(&mut self, values: &ValueTable, table: &StatementTable) -> Option<u32> {
        loop {
            match &mut self.scan {
                Scan::Pending => {
                    let context = self.contexts.next()?;
                    self.bound = Bound::new(self.spo, context);
                    self.scan = match self.bound.select_column(values) {
                        None => Scan::Table { pos: 0 },
                        Some((column, value)) => Scan::Chain {
                            column,
                            next: values.chain(value, column).head,
                        },
                    };
                }
                Scan::Table { pos } => {
                    while *pos < table.capacity() {
                        let slot = *pos;
                        *pos += 1;
                        if let Some(record) = table.live_record(slot) {
                            return Some(record);
                        }
                    }
                    self.scan = Scan::Pending;
                }
                Scan::Chain { column, next } => {
                    while *next != NIL {
                        let record = *next;
                        *next = table.next_in_chain(record, *column);
                        if self.bound.matches(table.quad(record)) {
                            return Some(record);
                        }
                    }
                    self.scan = Scan::Pending;
                }
            }
        }
    }
}

/// Lazy sequence of the quads matching a pattern.
///
/// With several contexts the per-context results are concatenated as-is.
pub struct Matches<'a> {
    pub(crate) store: &'a QuadStore,
    pub(crate) cursor: Cursor,
}

impl<'a> Iterator for Matches<'a> {
    type Item = QuadRef<'a>;

    fn next(&mut self) -> Option<QuadRef<'a>> {
        let record = self
            .cursor
            .advance(&self.store.values, &self.store.statements)?;
        Some(QuadRef {
            store: self.store,
            slots: *self.store.statements.quad(record),
        })
    }
}

/// Like [`Matches`], but holds the store mutably so the quad just yielded
/// can be removed with [`MatchesMut::remove_current`].
pub struct MatchesMut<'a> {
    pub(crate) store: &'a mut QuadStore,
    pub(crate) cursor: Cursor,
    pub(crate) current: Option<[u32; 4]>,
}

impl MatchesMut<'_> {
    /// Removes the quad returned by the last call to `next`. Returns false
    /// if there is none or it was already removed.
    pub fn remove_current(&mut self) -> bool {
        match self.current.take() {
            Some(quad) => {
                let store = &mut *self.store;
                store.statements.remove(&mut store.values, &quad)
            }
            None => false,
        }
    }

    /// Read access to the store, e.g. to look at the current quad's terms.
    pub fn store(&self) -> &QuadStore {
        self.store
    }
}

impl Iterator for MatchesMut<'_> {
    type Item = Quad;

    fn next(&mut self) -> Option<Quad> {
        let store = &*self.store;
        let Some(record) = self.cursor.advance(&store.values, &store.statements) else {
            self.current = None;
            return None;
        };
        let quad = *store.statements.quad(record);
        self.current = Some(quad);
        Some(store.quad_ids(quad))
    }
}
