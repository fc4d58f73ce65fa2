//! Reading RDF files into a store and writing store contents back out.
//! Parsing and serialization go through `oxigraph`.

use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::model::Quad as OxQuad;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::errors::{Error, Result};
use crate::store::QuadStore;
use crate::term::{Component, Pattern};

/// Guesses the RDF syntax from a file extension.
pub fn format_from_path(path: &Path) -> Option<RdfFormat> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    match ext {
        "n3" => Some(RdfFormat::Turtle),
        "xml" => Some(RdfFormat::RdfXml),
        ext => RdfFormat::from_extension(ext),
    }
}

/// Parses `reader` as `format` and adds every quad to `store`. Triples in
/// the source's default graph go to `context` when one is given, otherwise
/// to the store's default graph. Prefixes declared by the source are
/// recorded in the store's namespace map. Returns the number of quads that
/// were new.
pub fn load_reader<R: Read>(
    store: &mut QuadStore,
    reader: R,
    format: RdfFormat,
    context: Option<Component<'_>>,
) -> Result<usize> {
    let mut parser = RdfParser::from_format(format).for_reader(reader);
    let mut added = 0;
    let mut seen = 0;
    for quad in parser.by_ref() {
        let quad = quad?;
        seen += 1;
        let graph = match (quad.graph_name.is_default_graph(), context) {
            (true, Some(context)) => context,
            _ => Component::from(quad.graph_name.as_ref()),
        };
        if store.add(
            quad.subject.as_ref(),
            quad.predicate.as_ref(),
            quad.object.as_ref(),
            &[graph],
        )? {
            added += 1;
        }
    }
    for (prefix, name) in parser.prefixes() {
        store.set_namespace(prefix, Some(name));
    }
    debug!("parsed {} quads, {} new", seen, added);
    Ok(added)
}

/// Loads the RDF file at `path`, picking the parser from its extension.
pub fn load_file(
    store: &mut QuadStore,
    path: &Path,
    context: Option<Component<'_>>,
) -> Result<usize> {
    let format = format_from_path(path)
        .ok_or_else(|| Error::UnknownFormat(path.display().to_string()))?;
    let file = File::open(path)?;
    let added = load_reader(store, BufReader::new(file), format, context)?;
    info!("Loaded {} new quads from {}", added, path.display());
    Ok(added)
}

/// Writes the quads matching `pattern` as N-Quads. Returns how many were
/// written.
pub fn write_nquads<W: Write>(
    store: &QuadStore,
    pattern: &Pattern<'_>,
    writer: W,
) -> Result<usize> {
    let mut serializer =
        RdfSerializer::from_format(RdfFormat::NQuads).for_writer(BufWriter::new(writer));
    let mut written = 0;
    for quad in store.iter(pattern)? {
        let quad = OxQuad::try_from(quad)?;
        serializer.serialize_quad(&quad)?;
        written += 1;
    }
    serializer.finish()?.flush()?;
    Ok(written)
}
