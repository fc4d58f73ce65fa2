//! Content-level RDF terms and the pattern components built from them.
//!
//! A [`Term`] (or its borrowed form [`TermRef`]) describes a value by
//! content. The store turns content into interned [`ValueId`]s; a
//! [`Component`] lets callers use either form when building a [`Pattern`].

use std::fmt;

use crate::consts::{RDF_LANG_STRING, XSD_STRING};
use crate::model::{ValueId, ValueRef};

/// RDF term given by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// IRI/URI node.
    Iri(String),
    /// Blank node label (without the `_:` prefix).
    BlankNode(String),
    /// Literal with optional language tag or datatype.
    Literal {
        label: String,
        language: Option<String>,
        datatype: Option<String>,
    },
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    /// Plain literal, typed as `xsd:string`.
    pub fn literal(label: impl Into<String>) -> Self {
        Term::Literal {
            label: label.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn lang_literal(label: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            label: label.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn typed_literal(label: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            label: label.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn as_ref(&self) -> TermRef<'_> {
        match self {
            Term::Iri(iri) => TermRef::Iri(iri),
            Term::BlankNode(id) => TermRef::BlankNode(id),
            Term::Literal {
                label,
                language,
                datatype,
            } => TermRef::Literal {
                label,
                language: language.as_deref(),
                datatype: datatype.as_deref(),
            },
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.as_ref().fmt(f)
    }
}

/// Borrowed view of a [`Term`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermRef<'a> {
    Iri(&'a str),
    BlankNode(&'a str),
    Literal {
        label: &'a str,
        language: Option<&'a str>,
        datatype: Option<&'a str>,
    },
}

impl<'a> TermRef<'a> {
    pub fn is_iri(&self) -> bool {
        matches!(self, TermRef::Iri(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, TermRef::Literal { .. })
    }

    /// IRIs and blank nodes.
    pub fn is_resource(&self) -> bool {
        !self.is_literal()
    }

    /// Datatype a literal ends up with once interned: `rdf:langString` when
    /// a language tag is present, otherwise the given datatype or
    /// `xsd:string`. `None` for non-literals.
    pub fn effective_datatype(&self) -> Option<&'a str> {
        match self {
            TermRef::Literal {
                language: Some(_), ..
            } => Some(RDF_LANG_STRING),
            TermRef::Literal { datatype, .. } => Some(datatype.unwrap_or(XSD_STRING)),
            _ => None,
        }
    }

    pub fn into_owned(self) -> Term {
        match self {
            TermRef::Iri(iri) => Term::Iri(iri.to_string()),
            TermRef::BlankNode(id) => Term::BlankNode(id.to_string()),
            TermRef::Literal {
                label,
                language,
                datatype,
            } => Term::Literal {
                label: label.to_string(),
                language: language.map(str::to_string),
                datatype: datatype.map(str::to_string),
            },
        }
    }
}

impl<'a> From<&'a Term> for TermRef<'a> {
    fn from(term: &'a Term) -> Self {
        term.as_ref()
    }
}

fn write_escaped(f: &mut fmt::Formatter, label: &str) -> fmt::Result {
    for c in label.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => fmt::Write::write_char(f, c)?,
        }
    }
    Ok(())
}

/// N-Triples rendering. `xsd:string` datatypes are left implicit.
impl fmt::Display for TermRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TermRef::Iri(iri) => write!(f, "<{}>", iri),
            TermRef::BlankNode(id) => write!(f, "_:{}", id),
            TermRef::Literal {
                label,
                language,
                datatype,
            } => {
                f.write_str("\"")?;
                write_escaped(f, label)?;
                f.write_str("\"")?;
                match (language, datatype) {
                    (Some(lang), _) => write!(f, "@{}", lang),
                    (None, Some(dt)) if *dt != XSD_STRING => write!(f, "^^<{}>", dt),
                    _ => Ok(()),
                }
            }
        }
    }
}

/// Position of a component inside a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    Subject = 0,
    Predicate = 1,
    Object = 2,
    Context = 3,
}

impl Column {
    /// Scan precedence used to break ties between equally selective columns.
    pub const ALL: [Column; 4] = [
        Column::Subject,
        Column::Predicate,
        Column::Object,
        Column::Context,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether a term of this shape may occupy the column.
    pub fn accepts(self, term: TermRef<'_>) -> bool {
        match self {
            Column::Subject | Column::Context => term.is_resource(),
            Column::Predicate => term.is_iri(),
            Column::Object => true,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Column::Subject => "subject",
            Column::Predicate => "predicate",
            Column::Object => "object",
            Column::Context => "context",
        };
        f.write_str(name)
    }
}

/// One bound field of a [`Pattern`] or an argument of `QuadStore::add`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component<'a> {
    /// Resolved by content.
    Term(TermRef<'a>),
    /// Resolved by identity. Ids of another store never match.
    Value(ValueId),
    /// Resolved by identity in its own store and by content elsewhere.
    Stored(ValueRef<'a>),
    /// The store's default-graph sentinel.
    DefaultGraph,
}

impl<'a> From<TermRef<'a>> for Component<'a> {
    fn from(term: TermRef<'a>) -> Self {
        Component::Term(term)
    }
}

impl<'a> From<&'a Term> for Component<'a> {
    fn from(term: &'a Term) -> Self {
        Component::Term(term.as_ref())
    }
}

impl From<ValueId> for Component<'_> {
    fn from(id: ValueId) -> Self {
        Component::Value(id)
    }
}

impl<'a> From<ValueRef<'a>> for Component<'a> {
    fn from(value: ValueRef<'a>) -> Self {
        Component::Stored(value)
    }
}

/// A quad with any subset of its fields fixed.
///
/// An empty context list is a wildcard for lookups and removals; several
/// contexts are matched one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern<'a> {
    pub subject: Option<Component<'a>>,
    pub predicate: Option<Component<'a>>,
    pub object: Option<Component<'a>>,
    pub contexts: Vec<Component<'a>>,
}

impl<'a> Pattern<'a> {
    /// Matches every quad.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn subject(mut self, subject: impl Into<Component<'a>>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn predicate(mut self, predicate: impl Into<Component<'a>>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn object(mut self, object: impl Into<Component<'a>>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn context(mut self, context: impl Into<Component<'a>>) -> Self {
        self.contexts.push(context.into());
        self
    }

    pub fn default_graph(mut self) -> Self {
        self.contexts.push(Component::DefaultGraph);
        self
    }

    pub(crate) fn spo(&self) -> [(Column, Option<Component<'a>>); 3] {
        [
            (Column::Subject, self.subject),
            (Column::Predicate, self.predicate),
            (Column::Object, self.object),
        ]
    }
}
