use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use quadstore::consts::{RDF_LANG_STRING, XSD_STRING};
use quadstore::{
    Column, Component, Error, Pattern, QuadStore, StoreConfig, Term, TermRef, ValueId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

fn ex(local: &str) -> Term {
    Term::iri(format!("http://example.org/{}", local))
}

#[test]
fn test_add_query_remove_type_statement() {
    let mut store = QuadStore::new();
    let (a, person, ty) = (ex("a"), ex("Person"), Term::iri(RDF_TYPE));

    assert!(store.add(&a, &ty, &person, &[]).unwrap());
    assert!(!store.add(&a, &ty, &person, &[]).unwrap());
    assert_eq!(store.len(), 1);

    let found: Vec<_> = store.iter(&Pattern::any().subject(&a)).unwrap().collect();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].object().term(), person.as_ref());
    assert!(found[0].context().is_default_graph());
    assert_eq!(
        found[0].to_string(),
        format!(
            "(<http://example.org/a>, <{}>, <http://example.org/Person>)",
            RDF_TYPE
        )
    );

    let exact = Pattern::any()
        .subject(&a)
        .predicate(&ty)
        .object(&person)
        .default_graph();
    assert!(store.contains(&exact).unwrap());

    // the same triple in a named graph is a second quad
    let graph1 = ex("graph1");
    assert!(store.add(&a, &ty, &person, &[(&graph1).into()]).unwrap());
    let triple = Pattern::any().subject(&a).predicate(&ty).object(&person);
    assert_eq!(store.size(&triple).unwrap(), 2);
    assert_eq!(store.size(&exact).unwrap(), 1);

    // no contexts on remove means every context
    assert!(store.remove(&triple).unwrap());
    assert_eq!(store.size(&triple).unwrap(), 0);
    assert!(store.is_empty());
    assert!(!store.remove(&exact).unwrap());
    assert!(!store.contains(&Pattern::any().subject(&a)).unwrap());
    store.check_integrity().unwrap();
}

#[test]
fn test_language_tags_fold_case() {
    let mut store = QuadStore::new();
    let (a, label) = (ex("a"), ex("label"));

    assert!(store
        .add(&a, &label, &Term::lang_literal("hello", "en"), &[])
        .unwrap());
    assert!(!store
        .add(&a, &label, &Term::lang_literal("hello", "EN"), &[])
        .unwrap());
    assert_eq!(store.len(), 1);

    let value = store
        .lookup(Term::lang_literal("hello", "En").as_ref())
        .unwrap();
    assert_eq!(
        value.term(),
        TermRef::Literal {
            label: "hello",
            language: Some("en"),
            datatype: Some(RDF_LANG_STRING),
        }
    );

    // a plain literal is a different value
    assert!(store.add(&a, &label, &Term::literal("hello"), &[]).unwrap());
    assert!(!store
        .add(&a, &label, &Term::typed_literal("hello", XSD_STRING), &[])
        .unwrap());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_queries_do_not_intern() {
    let mut store = QuadStore::new();
    store.add(&ex("a"), &ex("p"), &ex("b"), &[]).unwrap();
    let values = store.value_count();

    let nobody = ex("nobody");
    let pattern = Pattern::any().subject(&nobody);
    assert_eq!(store.size(&pattern).unwrap(), 0);
    assert_eq!(store.iter(&pattern).unwrap().count(), 0);
    assert!(!store.contains(&pattern).unwrap());
    assert!(!store.remove(&pattern).unwrap());
    assert!(store.lookup(nobody.as_ref()).is_none());
    assert_eq!(store.value_count(), values);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_ids_from_another_store() {
    let mut one = QuadStore::new();
    let mut two = QuadStore::new();
    let a = one.intern(ex("a").as_ref()).unwrap();
    two.add(&ex("a"), &ex("p"), &ex("b"), &[]).unwrap();

    assert!(two.value(a).is_none());
    assert_eq!(two.size(&Pattern::any().subject(a)).unwrap(), 0);
    assert!(!two.remove(&Pattern::any().subject(a)).unwrap());
    assert!(matches!(
        two.add(a, &ex("p"), &ex("c"), &[]),
        Err(Error::ForeignValue(id)) if id == a
    ));
    assert_eq!(two.len(), 1);
    assert_ne!(a, two.lookup(ex("a").as_ref()).unwrap().id());
}

#[test]
fn test_values_across_stores_compare_by_content() {
    let mut one = QuadStore::new();
    let mut two = QuadStore::new();
    for store in [&mut one, &mut two] {
        store.add(&ex("a"), &ex("p"), &ex("b"), &[]).unwrap();
    }
    // different interning order in the second store
    two.add(&ex("z"), &ex("p"), &ex("b"), &[]).unwrap();

    let a1 = one.lookup(ex("a").as_ref()).unwrap();
    let a2 = two.lookup(ex("a").as_ref()).unwrap();
    assert_eq!(a1, a2);
    assert_ne!(a1.id(), a2.id());
    assert_ne!(a1, one.lookup(ex("b").as_ref()).unwrap());

    let q1 = one.iter(&Pattern::any()).unwrap().next().unwrap();
    let q2 = two
        .iter(&Pattern::any().subject(&ex("a")))
        .unwrap()
        .next()
        .unwrap();
    assert_eq!(q1, q2);

    assert_eq!(two.size(&Pattern::any().subject(a1)).unwrap(), 1);
    assert!(two.contains(&Pattern::any().subject(a1).object(q1.object())).unwrap());
    let unknown = one.intern(ex("only-in-one").as_ref()).unwrap();
    let unknown = one.value(unknown).unwrap();
    assert_eq!(two.size(&Pattern::any().subject(unknown)).unwrap(), 0);
}

#[test]
fn test_add_with_value_of_another_store() {
    let mut one = QuadStore::new();
    one.add(&ex("a"), &ex("p"), &Term::lang_literal("hi", "en"), &[])
        .unwrap();
    let quad = one.iter(&Pattern::any()).unwrap().next().unwrap();

    let mut two = QuadStore::new();
    assert!(two
        .add(quad.subject(), quad.predicate(), quad.object(), &[quad.context().into()])
        .unwrap());
    assert!(!two
        .add(&ex("a"), &ex("p"), &Term::lang_literal("hi", "EN"), &[])
        .unwrap());
    assert_eq!(two.len(), 1);
    assert!(two
        .contains(&Pattern::any().subject(&ex("a")).default_graph())
        .unwrap());

    let err = two
        .add(quad.object(), &ex("p"), &ex("b"), &[])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidComponent {
            column: Column::Subject,
            ..
        }
    ));
    assert_eq!(two.len(), 1);
    two.check_integrity().unwrap();
}

#[test]
fn test_invalid_components_rejected() {
    let mut store = QuadStore::new();
    let lit = Term::literal("x");

    let err = store
        .size(&Pattern::any().subject(&lit))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidComponent {
            column: Column::Subject,
            ..
        }
    ));
    assert!(matches!(
        store.iter(&Pattern::any().predicate(&Term::blank("b"))),
        Err(Error::InvalidComponent {
            column: Column::Predicate,
            ..
        })
    ));

    // one bad context rejects the whole add
    let err = store
        .add(&ex("a"), &ex("p"), &ex("b"), &[(&ex("g")).into(), (&lit).into()])
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidComponent {
            column: Column::Context,
            ..
        }
    ));
    assert!(store.is_empty());

    // a literal id is just as invalid as literal content
    let id = store.intern(lit.as_ref()).unwrap();
    assert!(store.add(id, &ex("p"), &ex("b"), &[]).is_err());
    assert!(store.add(&ex("a"), &ex("p"), id, &[]).unwrap());
}

#[test]
fn test_multiple_contexts() {
    let mut store = QuadStore::new();
    let (a, p, b) = (ex("a"), ex("p"), ex("b"));
    let (g1, g2, g3) = (ex("g1"), ex("g2"), ex("g3"));
    let contexts = [(&g1).into(), (&g2).into(), Component::DefaultGraph];

    assert!(store.add(&a, &p, &b, &contexts).unwrap());
    assert!(!store.add(&a, &p, &b, &contexts).unwrap());
    assert_eq!(store.len(), 3);
    assert_eq!(store.size(&Pattern::any().subject(&a)).unwrap(), 3);
    assert_eq!(
        store
            .size(&Pattern::any().context(&g1).context(&g2))
            .unwrap(),
        2
    );
    // unknown contexts are skipped, not fatal
    assert_eq!(
        store
            .size(&Pattern::any().context(&g3).context(&g2))
            .unwrap(),
        1
    );

    assert!(store.remove(&Pattern::any().context(&g1)).unwrap());
    assert_eq!(store.len(), 2);
    assert!(store
        .remove(&Pattern::any().subject(&a).predicate(&p).object(&b).context(&g2))
        .unwrap());
    assert_eq!(store.size(&Pattern::any().default_graph()).unwrap(), 1);
    store.check_integrity().unwrap();
}

#[test]
fn test_remove_during_iteration() {
    let mut store = QuadStore::new();
    let predicates: Vec<Term> = (0..3).map(|i| ex(&format!("p{}", i))).collect();
    for i in 0..100 {
        store
            .add(
                &ex(&format!("s{}", i % 10)),
                &predicates[i % 3],
                &Term::literal(i.to_string()),
                &[],
            )
            .unwrap();
    }
    let pattern = Pattern::any().predicate(&predicates[0]);
    assert_eq!(store.size(&pattern).unwrap(), 34);

    let mut matches = store.iter_mut(&pattern).unwrap();
    let (mut seen, mut removed) = (0, 0);
    while let Some(quad) = matches.next() {
        assert_eq!(
            matches.store().value(quad.predicate).unwrap().term(),
            predicates[0].as_ref()
        );
        seen += 1;
        if seen % 2 == 0 {
            assert!(matches.remove_current());
            assert!(!matches.remove_current());
            removed += 1;
        }
    }
    assert_eq!(seen, 34);
    assert_eq!(removed, 17);
    assert_eq!(store.size(&pattern).unwrap(), 17);
    assert_eq!(store.len(), 83);
    store.check_integrity().unwrap();
}

#[test]
fn test_remove_during_full_scan() {
    let mut store = QuadStore::new();
    let g = ex("g");
    let in_graph = [Component::from(&g)];
    for i in 0..200 {
        let context: &[Component<'_>] = if i % 2 == 0 { &[] } else { &in_graph };
        store
            .add(
                &ex(&format!("s{}", i % 7)),
                &ex(&format!("p{}", i % 5)),
                &Term::literal(i.to_string()),
                context,
            )
            .unwrap();
    }
    assert_eq!(store.len(), 200);

    let mut visited = HashSet::new();
    let mut removed = 0;
    let mut matches = store.iter_mut(&Pattern::any()).unwrap();
    while let Some(quad) = matches.next() {
        assert!(visited.insert(quad), "quad yielded twice");
        if visited.len() % 3 != 0 {
            assert!(matches.remove_current());
            removed += 1;
        }
    }
    assert_eq!(visited.len(), 200);
    assert_eq!(removed, 134);
    assert_eq!(store.len(), 66);
    store.check_integrity().unwrap();
}

#[test]
fn test_clear_keeps_values() {
    let mut store = QuadStore::new();
    for i in 0..50 {
        store
            .add(&ex(&format!("s{}", i)), &ex("p"), &ex("o"), &[])
            .unwrap();
    }
    let values = store.value_count();
    assert!(store.remove(&Pattern::any()).unwrap());
    assert!(store.is_empty());
    assert!(!store.remove(&Pattern::any()).unwrap());
    assert!(!store.clear());
    assert_eq!(store.value_count(), values);
    assert!(store.add(&ex("s1"), &ex("p"), &ex("o"), &[]).unwrap());
    store.check_integrity().unwrap();
}

#[test]
fn test_growth_from_minimal_capacity() {
    let mut store = QuadStore::with_config(StoreConfig::with_capacities(0, 0));
    let p = ex("p");
    for i in 0..5_000 {
        let s = ex(&format!("s{}", i % 97));
        assert!(store
            .add(&s, &p, &Term::literal(i.to_string()), &[])
            .unwrap());
    }
    assert_eq!(store.len(), 5_000);
    for i in (0..5_000).step_by(2) {
        let s = ex(&format!("s{}", i % 97));
        let o = Term::literal(i.to_string());
        assert!(store
            .remove(&Pattern::any().subject(&s).predicate(&p).object(&o).default_graph())
            .unwrap());
    }
    assert_eq!(store.len(), 2_500);
    assert_eq!(store.size(&Pattern::any().predicate(&p)).unwrap(), 2_500);
    store.check_integrity().unwrap();
}

#[test]
fn test_custom_default_graph() {
    let config = StoreConfig {
        default_graph: "urn:x-local:default".to_string(),
        ..Default::default()
    };
    let mut store = QuadStore::with_config(config);
    assert_eq!(
        store.default_graph().term(),
        TermRef::Iri("urn:x-local:default")
    );
    store.add(&ex("a"), &ex("p"), &ex("b"), &[]).unwrap();
    let named = Term::iri("urn:x-local:default");
    assert_eq!(store.size(&Pattern::any().context(&named)).unwrap(), 1);
}

#[test]
fn test_readers_share_store_across_threads() {
    let mut store = QuadStore::new();
    for i in 0..400 {
        store
            .add(
                &ex(&format!("s{}", i)),
                &ex(&format!("p{}", i % 4)),
                &ex("o"),
                &[],
            )
            .unwrap();
    }
    let store = Arc::new(store);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let p = ex(&format!("p{}", i));
                store.size(&Pattern::any().predicate(&p)).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 100);
    }
}

/// Terms used by the randomized comparison against a plain set of quads.
/// `None` stands for the default graph.
struct Pools {
    columns: [Vec<Option<Term>>; 4],
}

impl Pools {
    fn new() -> Self {
        let subjects = (0..5)
            .map(|i| ex(&format!("s{}", i)))
            .chain([Term::blank("b0")])
            .map(Some)
            .collect();
        let predicates = (0..4).map(|i| Some(ex(&format!("p{}", i)))).collect();
        let objects = (0..3)
            .map(|i| ex(&format!("o{}", i)))
            .chain([
                Term::literal("one"),
                Term::lang_literal("one", "en"),
                Term::typed_literal("1", "http://www.w3.org/2001/XMLSchema#integer"),
            ])
            .map(Some)
            .collect();
        let contexts = vec![Some(ex("g0")), Some(ex("g1")), Some(Term::blank("g2")), None];
        Pools {
            columns: [subjects, predicates, objects, contexts],
        }
    }

    fn component(&self, column: usize, index: usize) -> Component<'_> {
        match &self.columns[column][index] {
            Some(term) => term.into(),
            None => Component::DefaultGraph,
        }
    }

    fn random_quad(&self, rng: &mut StdRng) -> [usize; 4] {
        let mut quad = [0; 4];
        for (value, column) in quad.iter_mut().zip(&self.columns) {
            *value = rng.random_range(0..column.len());
        }
        quad
    }

    fn random_pattern(&self, rng: &mut StdRng) -> [Option<usize>; 4] {
        let quad = self.random_quad(rng);
        let mut pattern = [None; 4];
        for (bound, value) in pattern.iter_mut().zip(quad) {
            if rng.random_bool(0.4) {
                *bound = Some(value);
            }
        }
        pattern
    }

    fn pattern(&self, bound: [Option<usize>; 4]) -> Pattern<'_> {
        Pattern {
            subject: bound[0].map(|i| self.component(0, i)),
            predicate: bound[1].map(|i| self.component(1, i)),
            object: bound[2].map(|i| self.component(2, i)),
            contexts: bound[3].map(|i| self.component(3, i)).into_iter().collect(),
        }
    }

    /// Id of every pool value, per column.
    fn ids(&self, store: &mut QuadStore) -> [HashMap<ValueId, usize>; 4] {
        let mut ids: [HashMap<ValueId, usize>; 4] = Default::default();
        for (map, column) in ids.iter_mut().zip(&self.columns) {
            for (i, term) in column.iter().enumerate() {
                let id = match term {
                    Some(term) => store.intern(term.as_ref()).unwrap(),
                    None => store.default_graph().id(),
                };
                map.insert(id, i);
            }
        }
        ids
    }
}

fn model_matches(model: &HashSet<[usize; 4]>, bound: [Option<usize>; 4]) -> HashSet<[usize; 4]> {
    model
        .iter()
        .filter(|quad| {
            quad.iter()
                .zip(bound)
                .all(|(value, b)| b.map_or(true, |b| b == *value))
        })
        .copied()
        .collect()
}

#[test]
fn test_agrees_with_naive_model() {
    let pools = Pools::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut store = QuadStore::with_config(StoreConfig::with_capacities(8, 8));
    let ids = pools.ids(&mut store);
    let mut model: HashSet<[usize; 4]> = HashSet::new();

    let to_indices = |store: &QuadStore, bound: [Option<usize>; 4]| -> HashSet<[usize; 4]> {
        store
            .iter(&pools.pattern(bound))
            .unwrap()
            .map(|quad| {
                let quad = quad.quad();
                [
                    ids[0][&quad.subject],
                    ids[1][&quad.predicate],
                    ids[2][&quad.object],
                    ids[3][&quad.context],
                ]
            })
            .collect()
    };

    for round in 0..3_000 {
        if rng.random_bool(0.7) {
            let quad = pools.random_quad(&mut rng);
            let [s, p, o, c] = quad;
            let added = store
                .add(
                    pools.component(0, s),
                    pools.component(1, p),
                    pools.component(2, o),
                    &[pools.component(3, c)],
                )
                .unwrap();
            assert_eq!(added, model.insert(quad));
        } else {
            let bound = pools.random_pattern(&mut rng);
            let expected = model_matches(&model, bound);
            let removed = store.remove(&pools.pattern(bound)).unwrap();
            assert_eq!(removed, !expected.is_empty());
            model.retain(|quad| !expected.contains(quad));
        }
        assert_eq!(store.len(), model.len());

        if round % 100 == 0 {
            store.check_integrity().unwrap();
            for _ in 0..20 {
                let bound = pools.random_pattern(&mut rng);
                let expected = model_matches(&model, bound);
                let pattern = pools.pattern(bound);
                assert_eq!(store.size(&pattern).unwrap(), expected.len());
                assert_eq!(store.contains(&pattern).unwrap(), !expected.is_empty());
                let found = to_indices(&store, bound);
                assert_eq!(found, expected);
                // chain walk and full scan agree
                let scanned: HashSet<[usize; 4]> = to_indices(&store, [None; 4])
                    .into_iter()
                    .filter(|quad| {
                        quad.iter()
                            .zip(bound)
                            .all(|(value, b)| b.map_or(true, |b| b == *value))
                    })
                    .collect();
                assert_eq!(found, scanned);
                // each quad is yielded once
                assert_eq!(
                    store.iter(&pattern).unwrap().count(),
                    expected.len()
                );
            }
        }
    }
    store.check_integrity().unwrap();
}
