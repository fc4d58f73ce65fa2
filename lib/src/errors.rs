use crate::model::ValueId;
use crate::term::Column;

/// Errors surfaced by the store and its I/O helpers.
///
/// Duplicate inserts and removals of missing quads are not errors; those
/// operations report `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A term of the wrong kind was given for a column, e.g. a literal
    /// predicate. Nothing is changed.
    #[error("{term} cannot be used as {column}")]
    InvalidComponent { column: Column, term: String },

    /// An id interned by another store was given where content is needed.
    #[error("value {0:?} was interned by another store")]
    ForeignValue(ValueId),

    #[error("cannot grow the {table} table to {requested} slots")]
    CapacityExhausted {
        table: &'static str,
        requested: usize,
    },

    /// Chains, counters or table membership disagree.
    #[error("store integrity violated: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "oxigraph")]
    #[error(transparent)]
    Parse(#[from] oxigraph::io::RdfParseError),

    #[cfg(feature = "oxigraph")]
    #[error("cannot guess the RDF format of {0}")]
    UnknownFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;
