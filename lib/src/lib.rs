//! quadstore: an in-memory RDF quad store.
//!
//! Every IRI, blank node and literal is interned once and addressed by a
//! [`ValueId`]. Quads are kept deduplicated in an open-addressed table, and
//! each stored quad is linked into four chains, one per column, anchored on
//! the value in that column. A [`Pattern`] is answered by walking the
//! shortest chain among its bound values.
//!
//! Quick start
//!
//! ```
//! use quadstore::{Pattern, QuadStore, Term};
//!
//! let mut store = QuadStore::new();
//! let alice = Term::iri("http://example.org/alice");
//! let name = Term::iri("http://xmlns.com/foaf/0.1/name");
//! let graph = Term::iri("http://example.org/people");
//!
//! store
//!     .add(&alice, &name, &Term::lang_literal("Alice", "en"), &[(&graph).into()])
//!     .unwrap();
//! assert_eq!(store.size(&Pattern::any().subject(&alice)).unwrap(), 1);
//!
//! for quad in store.iter(&Pattern::any().predicate(&name)).unwrap() {
//!     println!("{}", quad);
//! }
//!
//! store.remove(&Pattern::any().context(&graph)).unwrap();
//! assert!(store.is_empty());
//! ```
//!
//! With the default `oxigraph` feature, [`io`] loads RDF files through the
//! oxigraph parsers and writes N-Quads back out.

pub mod config;
pub mod consts;
#[cfg(feature = "oxigraph")]
mod convert;
pub mod errors;
#[cfg(feature = "oxigraph")]
pub mod io;
mod model;
mod query;
mod statements;
mod store;
mod term;
mod util;
mod values;

pub use config::StoreConfig;
pub use errors::{Error, Result};
pub use model::{Quad, QuadRef, ValueId, ValueRef};
pub use query::{Matches, MatchesMut};
pub use store::QuadStore;
pub use term::{Column, Component, Pattern, Term, TermRef};
