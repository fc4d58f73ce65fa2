//! Conversions between store terms and `oxigraph` model types.

use oxigraph::model::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, Literal, LiteralRef, NamedNode,
    NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad as OxQuad, Term as OxTerm,
    TermRef as OxTermRef,
};

use crate::errors::{Error, Result};
use crate::model::{QuadRef, ValueRef};
use crate::term::{Component, TermRef};

impl<'a> From<NamedNodeRef<'a>> for TermRef<'a> {
    fn from(node: NamedNodeRef<'a>) -> Self {
        TermRef::Iri(node.as_str())
    }
}

impl<'a> From<BlankNodeRef<'a>> for TermRef<'a> {
    fn from(node: BlankNodeRef<'a>) -> Self {
        TermRef::BlankNode(node.as_str())
    }
}

impl<'a> From<LiteralRef<'a>> for TermRef<'a> {
    fn from(literal: LiteralRef<'a>) -> Self {
        match literal.language() {
            Some(language) => TermRef::Literal {
                label: literal.value(),
                language: Some(language),
                datatype: None,
            },
            None => TermRef::Literal {
                label: literal.value(),
                language: None,
                datatype: Some(literal.datatype().as_str()),
            },
        }
    }
}

impl<'a> From<NamedOrBlankNodeRef<'a>> for TermRef<'a> {
    fn from(node: NamedOrBlankNodeRef<'a>) -> Self {
        match node {
            NamedOrBlankNodeRef::NamedNode(node) => node.into(),
            NamedOrBlankNodeRef::BlankNode(node) => node.into(),
        }
    }
}

impl<'a> From<OxTermRef<'a>> for TermRef<'a> {
    fn from(term: OxTermRef<'a>) -> Self {
        match term {
            OxTermRef::NamedNode(node) => node.into(),
            OxTermRef::BlankNode(node) => node.into(),
            OxTermRef::Literal(literal) => literal.into(),
        }
    }
}

impl<'a> From<NamedNodeRef<'a>> for Component<'a> {
    fn from(node: NamedNodeRef<'a>) -> Self {
        Component::Term(node.into())
    }
}

impl<'a> From<NamedOrBlankNodeRef<'a>> for Component<'a> {
    fn from(node: NamedOrBlankNodeRef<'a>) -> Self {
        Component::Term(node.into())
    }
}

impl<'a> From<OxTermRef<'a>> for Component<'a> {
    fn from(term: OxTermRef<'a>) -> Self {
        Component::Term(term.into())
    }
}

/// The default graph maps to the store's default-graph sentinel.
impl<'a> From<GraphNameRef<'a>> for Component<'a> {
    fn from(graph: GraphNameRef<'a>) -> Self {
        match graph {
            GraphNameRef::NamedNode(node) => node.into(),
            GraphNameRef::BlankNode(node) => Component::Term(node.into()),
            GraphNameRef::DefaultGraph => Component::DefaultGraph,
        }
    }
}

impl From<TermRef<'_>> for OxTerm {
    fn from(term: TermRef<'_>) -> Self {
        match term {
            TermRef::Iri(iri) => NamedNode::new_unchecked(iri).into(),
            TermRef::BlankNode(id) => BlankNode::new_unchecked(id).into(),
            TermRef::Literal {
                label,
                language: Some(language),
                ..
            } => Literal::new_language_tagged_literal_unchecked(label, language).into(),
            TermRef::Literal { label, .. } => match term.effective_datatype() {
                Some(datatype) => {
                    Literal::new_typed_literal(label, NamedNode::new_unchecked(datatype)).into()
                }
                None => Literal::new_simple_literal(label).into(),
            },
        }
    }
}

fn resource(term: TermRef<'_>) -> Result<NamedOrBlankNode> {
    match term {
        TermRef::Iri(iri) => Ok(NamedNode::new_unchecked(iri).into()),
        TermRef::BlankNode(id) => Ok(BlankNode::new_unchecked(id).into()),
        TermRef::Literal { .. } => Err(Error::Corrupt(format!(
            "literal {} stored in a resource column",
            term
        ))),
    }
}

impl ValueRef<'_> {
    pub fn to_oxigraph(&self) -> OxTerm {
        self.term().into()
    }

    /// The value as a graph name; the store's default graph becomes
    /// [`GraphName::DefaultGraph`].
    pub fn to_graph_name(&self) -> Result<GraphName> {
        if self.is_default_graph() {
            return Ok(GraphName::DefaultGraph);
        }
        Ok(match resource(self.term())? {
            NamedOrBlankNode::NamedNode(node) => GraphName::NamedNode(node),
            NamedOrBlankNode::BlankNode(node) => GraphName::BlankNode(node),
        })
    }
}

impl TryFrom<QuadRef<'_>> for OxQuad {
    type Error = Error;

    fn try_from(quad: QuadRef<'_>) -> Result<Self> {
        let predicate = match quad.predicate().term() {
            TermRef::Iri(iri) => NamedNode::new_unchecked(iri),
            other => {
                return Err(Error::Corrupt(format!(
                    "{} stored in the predicate column",
                    other
                )))
            }
        };
        Ok(OxQuad::new(
            resource(quad.subject().term())?,
            predicate,
            quad.object().to_oxigraph(),
            quad.context().to_graph_name()?,
        ))
    }
}
