//! The quad store: value interning, statement storage and the mutation
//! engine that ties them to patterns.

use hashbrown::HashMap;
use log::debug;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::config::{table_capacity, StoreConfig};
use crate::consts::NIL;
use crate::errors::{Error, Result};
use crate::model::{Quad, QuadRef, ValueId, ValueRef};
use crate::query::{any_match, count_matches, Bound, Cursor, Matches, MatchesMut, Plan};
use crate::statements::StatementTable;
use crate::term::{Column, Component, Pattern, TermRef};
use crate::values::ValueTable;

// every store gets its own tag so ids from another store never resolve
static NEXT_STORE_TAG: AtomicU32 = AtomicU32::new(0);

/// In-memory store of RDF quads.
///
/// Values are interned once and never removed; statements are indexed by
/// each of their four components so that any pattern is answered by walking
/// the shortest matching chain.
///
/// The store does no locking of its own. It can be moved to and shared
/// between threads, and `&mut self` on every mutation keeps writers
/// exclusive.
#[derive(Debug)]
pub struct QuadStore {
    pub(crate) tag: u32,
    pub(crate) values: ValueTable,
    pub(crate) statements: StatementTable,
    pub(crate) default_graph: u32,
    namespaces: HashMap<String, String>,
    config: StoreConfig,
}

impl Default for QuadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        let values = ValueTable::new(
            table_capacity(config.value_capacity),
            &config.default_graph,
        );
        let statements = StatementTable::new(table_capacity(config.statement_capacity));
        let tag = NEXT_STORE_TAG.fetch_add(1, Ordering::Relaxed);
        debug!(
            "created store {} (default graph <{}>)",
            tag, config.default_graph
        );
        QuadStore {
            tag,
            values,
            statements,
            // the seed value of the interning table
            default_graph: 0,
            namespaces: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of stored quads.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.len() == 0
    }

    /// Number of interned values, the default-graph sentinel included.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn default_graph(&self) -> ValueRef<'_> {
        self.value_at(self.default_graph)
    }

    fn value_at(&self, slot: u32) -> ValueRef<'_> {
        ValueRef { store: self, slot }
    }

    fn id(&self, slot: u32) -> ValueId {
        ValueId {
            store: self.tag,
            slot,
        }
    }

    pub(crate) fn quad_ids(&self, quad: [u32; 4]) -> Quad {
        Quad {
            subject: self.id(quad[0]),
            predicate: self.id(quad[1]),
            object: self.id(quad[2]),
            context: self.id(quad[3]),
        }
    }

    /// The value behind `id`, or `None` if it belongs to another store.
    pub fn value(&self, id: ValueId) -> Option<ValueRef<'_>> {
        self.own_slot(id).map(|slot| self.value_at(slot))
    }

    /// The interned value equal to `term`, without interning it.
    pub fn lookup(&self, term: TermRef<'_>) -> Option<ValueRef<'_>> {
        self.values.lookup(term).map(|slot| self.value_at(slot))
    }

    /// Interns `term` and returns its id. Interning an equal term again
    /// returns the same id.
    pub fn intern(&mut self, term: TermRef<'_>) -> Result<ValueId> {
        let slot = self.values.intern(term)?;
        Ok(self.id(slot))
    }

    /// Resolves the ids of `quad` against this store.
    pub fn quad(&self, quad: Quad) -> Option<QuadRef<'_>> {
        Some(QuadRef {
            store: self,
            slots: [
                self.own_slot(quad.subject)?,
                self.own_slot(quad.predicate)?,
                self.own_slot(quad.object)?,
                self.own_slot(quad.context)?,
            ],
        })
    }

    fn own_slot(&self, id: ValueId) -> Option<u32> {
        if id.store == self.tag && (id.slot as usize) < self.values.len() {
            Some(id.slot)
        } else {
            None
        }
    }

    /// Rejects components whose kind can never appear in `column`.
    fn check_component(&self, component: Component<'_>, column: Column) -> Result<()> {
        let accepted = match component {
            Component::Term(term) => column.accepts(term),
            Component::Value(id) => match self.own_slot(id) {
                Some(slot) => self.values.accepts(slot, column),
                // foreign ids resolve as absent
                None => true,
            },
            Component::Stored(value) => column.accepts(value.term()),
            Component::DefaultGraph => true,
        };
        if accepted {
            return Ok(());
        }
        let term = match component {
            Component::Term(term) => term.to_string(),
            Component::Value(id) => self.values.term(id.slot).to_string(),
            Component::Stored(value) => value.to_string(),
            Component::DefaultGraph => self.default_graph().to_string(),
        };
        Err(Error::InvalidComponent { column, term })
    }

    /// Slot of an existing value matching `component`.
    fn resolve(&self, component: Component<'_>) -> Option<u32> {
        match component {
            Component::Term(term) => self.values.lookup(term),
            Component::Value(id) => self.own_slot(id),
            Component::Stored(value) => match self.own_slot(value.id()) {
                Some(slot) => Some(slot),
                None => self.values.lookup(value.term()),
            },
            Component::DefaultGraph => Some(self.default_graph),
        }
    }

    fn resolve_or_intern(&mut self, component: Component<'_>) -> Result<u32> {
        match component {
            Component::Term(term) => self.values.intern(term),
            Component::Value(id) => self.own_slot(id).ok_or(Error::ForeignValue(id)),
            Component::Stored(value) => match self.own_slot(value.id()) {
                Some(slot) => Ok(slot),
                None => self.values.intern(value.term()),
            },
            Component::DefaultGraph => Ok(self.default_graph),
        }
    }

    /// Validates `pattern` and resolves it to value slots. `Ok(None)` means
    /// a bound subject, predicate or object does not exist, so nothing can
    /// match.
    fn plan(&self, pattern: &Pattern<'_>) -> Result<Option<Plan>> {
        let spo = pattern.spo();
        for (column, component) in spo {
            if let Some(component) = component {
                self.check_component(component, column)?;
            }
        }
        for &context in &pattern.contexts {
            self.check_component(context, Column::Context)?;
        }

        let mut slots = [None; 3];
        for (slot, (_, component)) in slots.iter_mut().zip(spo) {
            if let Some(component) = component {
                match self.resolve(component) {
                    Some(found) => *slot = Some(found),
                    None => return Ok(None),
                }
            }
        }
        let contexts = if pattern.contexts.is_empty() {
            vec![None]
        } else {
            pattern
                .contexts
                .iter()
                .filter_map(|&context| self.resolve(context))
                .map(Some)
                .collect()
        };
        Ok(Some(Plan {
            spo: slots,
            contexts,
        }))
    }

    /// Adds `(subject, predicate, object)` to every context in `contexts`,
    /// or to the default graph when `contexts` is empty. Returns whether at
    /// least one quad was new.
    ///
    /// All components are validated before anything is interned, so an
    /// invalid argument leaves the store untouched.
    pub fn add<'a>(
        &mut self,
        subject: impl Into<Component<'a>>,
        predicate: impl Into<Component<'a>>,
        object: impl Into<Component<'a>>,
        contexts: &[Component<'a>],
    ) -> Result<bool> {
        let spo = [
            (Column::Subject, subject.into()),
            (Column::Predicate, predicate.into()),
            (Column::Object, object.into()),
        ];
        let all = spo
            .iter()
            .copied()
            .chain(contexts.iter().map(|&c| (Column::Context, c)));
        for (column, component) in all {
            self.check_component(component, column)?;
            if let Component::Value(id) = component {
                if self.own_slot(id).is_none() {
                    return Err(Error::ForeignValue(id));
                }
            }
        }

        let s = self.resolve_or_intern(spo[0].1)?;
        let p = self.resolve_or_intern(spo[1].1)?;
        let o = self.resolve_or_intern(spo[2].1)?;
        if contexts.is_empty() {
            let quad = [s, p, o, self.default_graph];
            return self.statements.insert(&mut self.values, quad);
        }
        let mut modified = false;
        for &context in contexts {
            let c = self.resolve_or_intern(context)?;
            modified |= self.statements.insert(&mut self.values, [s, p, o, c])?;
        }
        Ok(modified)
    }

    /// Removes every quad matching `pattern`. Returns whether anything was
    /// removed.
    pub fn remove(&mut self, pattern: &Pattern<'_>) -> Result<bool> {
        let Some(plan) = self.plan(pattern)? else {
            return Ok(false);
        };
        let mut modified = false;
        for bound in plan.bounds() {
            modified |= self.remove_bound(bound);
        }
        Ok(modified)
    }

    fn remove_bound(&mut self, bound: Bound) -> bool {
        if self.statements.len() == 0 {
            return false;
        }
        if let Some(quad) = bound.complete() {
            return self.statements.remove(&mut self.values, &quad);
        }
        let Some((column, value)) = bound.select_column(&self.values) else {
            return self.statements.clear(&mut self.values);
        };
        let mut removed = 0usize;
        let mut record = self.values.chain(value, column).head;
        while record != NIL {
            // read the successor first, removal unlinks `record`
            let next = self.statements.next_in_chain(record, column);
            let quad = *self.statements.quad(record);
            if bound.matches(&quad) && self.statements.remove(&mut self.values, &quad) {
                removed += 1;
            }
            record = next;
        }
        if removed > 0 {
            debug!("removed {} quads along the {} chain", removed, Column::ALL[column]);
        }
        removed > 0
    }

    /// Number of quads matching `pattern`.
    pub fn size(&self, pattern: &Pattern<'_>) -> Result<usize> {
        let Some(plan) = self.plan(pattern)? else {
            return Ok(0);
        };
        Ok(plan
            .bounds()
            .map(|bound| count_matches(bound, &self.values, &self.statements))
            .sum())
    }

    /// Whether at least one quad matches `pattern`.
    pub fn contains(&self, pattern: &Pattern<'_>) -> Result<bool> {
        let Some(plan) = self.plan(pattern)? else {
            return Ok(false);
        };
        let found = plan.bounds().any(|bound| match bound.complete() {
            Some(quad) => self.statements.contains(&quad),
            None => any_match(bound, &self.values, &self.statements),
        });
        Ok(found)
    }

    /// Quads matching `pattern`, computed lazily.
    pub fn iter(&self, pattern: &Pattern<'_>) -> Result<Matches<'_>> {
        let plan = self.plan(pattern)?;
        Ok(Matches {
            store: self,
            cursor: Cursor::new(plan),
        })
    }

    /// Like [`QuadStore::iter`], but the returned iterator can remove the
    /// quad it just yielded.
    pub fn iter_mut(&mut self, pattern: &Pattern<'_>) -> Result<MatchesMut<'_>> {
        let plan = self.plan(pattern)?;
        Ok(MatchesMut {
            store: self,
            cursor: Cursor::new(plan),
            current: None,
        })
    }

    /// Every stored quad.
    pub fn quads(&self) -> Matches<'_> {
        Matches {
            store: self,
            cursor: Cursor::new(Some(Plan {
                spo: [None; 3],
                contexts: vec![None],
            })),
        }
    }

    /// Removes the quads matching `pattern` for which `keep` returns false.
    /// Returns the number removed.
    pub fn retain<F>(&mut self, pattern: &Pattern<'_>, mut keep: F) -> Result<usize>
    where
        F: FnMut(QuadRef<'_>) -> bool,
    {
        let mut matches = self.iter_mut(pattern)?;
        let mut removed = 0;
        while let Some(quad) = matches.next() {
            let kept = match matches.store().quad(quad) {
                Some(quad) => keep(quad),
                None => true,
            };
            if !kept && matches.remove_current() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes every quad. Interned values and namespaces stay. Returns
    /// false if the store was already empty.
    pub fn clear(&mut self) -> bool {
        self.statements.clear(&mut self.values)
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.namespaces.get(prefix).map(String::as_str)
    }

    /// Binds `prefix` to `name`, or unbinds it when `name` is `None`.
    /// Returns the previous binding.
    pub fn set_namespace(&mut self, prefix: &str, name: Option<&str>) -> Option<String> {
        match name {
            Some(name) => self
                .namespaces
                .insert(prefix.to_string(), name.to_string()),
            None => self.namespaces.remove(prefix),
        }
    }

    /// Prefix bindings in no particular order.
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.namespaces
            .iter()
            .map(|(prefix, name)| (prefix.as_str(), name.as_str()))
    }

    /// Walks every table and chain and reports the first inconsistency
    /// found.
    pub fn check_integrity(&self) -> Result<()> {
        self.statements.check(&self.values)
    }
}
