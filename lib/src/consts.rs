//! IRIs the store needs to know about: literal datatype defaults and the
//! sentinel used for the default graph.

pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

// sesame:nil, the conventional name for the default graph
pub const DEFAULT_GRAPH: &str = "http://www.openrdf.org/schema/sesame#nil";

/// Smallest capacity either hash table is allowed to start with.
pub const MIN_TABLE_CAPACITY: usize = 8;
pub const DEFAULT_VALUE_CAPACITY: usize = 256;
pub const DEFAULT_STATEMENT_CAPACITY: usize = 256;

/// Marker for "no record" / "no value" in chain links and hash slots.
pub(crate) const NIL: u32 = u32::MAX;
