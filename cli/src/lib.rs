use anyhow::{anyhow, Context, Error, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use oxigraph::model::{NamedNode, Term as OxTerm};
use quadstore::io::{load_file, write_nquads};
use quadstore::{Component, Pattern, QuadStore, StoreConfig, Term, TermRef};
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(name = "quadstore")]
#[command(about = "Load RDF files into an in-memory quad store and query them")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the log level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the log level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// Store configuration file (JSON); defaults are used when omitted
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
    /// RDF file to load before running the command; the format follows the extension.
    /// May be given several times.
    #[clap(long = "input", short = 'i', global = true)]
    inputs: Vec<PathBuf>,
    /// Load the inputs' default-graph triples into this graph instead
    #[clap(long, global = true)]
    into: Option<String>,
}

/// Terms are written in N-Triples syntax (`<iri>`, `_:b0`, `"label"@en`,
/// `"1"^^<datatype>`); a bare IRI is accepted too.
#[derive(Debug, Args)]
struct PatternArgs {
    /// Subject to match
    #[clap(long, short)]
    subject: Option<String>,
    /// Predicate to match
    #[clap(long, short)]
    predicate: Option<String>,
    /// Object to match
    #[clap(long, short)]
    object: Option<String>,
    /// Graph to match, may be repeated; every graph matches when omitted
    #[clap(long = "context", short = 'g')]
    contexts: Vec<String>,
    /// Match the default graph (in addition to any --context)
    #[clap(long, action, default_value = "false")]
    default_graph: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the number of quads, values, graphs and namespaces
    Stat {
        /// Output JSON instead of text
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Print the number of quads matching a pattern
    Count {
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Print the quads matching a pattern as N-Quads
    Query {
        #[command(flatten)]
        pattern: PatternArgs,
    },
    /// Remove the quads matching a pattern
    Remove {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Write the remaining quads to this file as N-Quads
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the effective store configuration as JSON
    Config,
}

/// Parses a term in N-Triples syntax, falling back to a bare IRI.
pub fn parse_term(text: &str) -> Result<Term> {
    let text = text.trim();
    let term = match OxTerm::from_str(text) {
        Ok(term) => term,
        Err(_) => NamedNode::new(text)
            .map_err(|e| anyhow!("invalid term {}: {}", text, e))?
            .into(),
    };
    Ok(TermRef::from(term.as_ref()).into_owned())
}

/// Parsed form of [`PatternArgs`]; owns the terms a [`Pattern`] borrows.
struct PatternTerms {
    subject: Option<Term>,
    predicate: Option<Term>,
    object: Option<Term>,
    contexts: Vec<Term>,
    default_graph: bool,
}

impl PatternArgs {
    fn parse(&self) -> Result<PatternTerms> {
        let parse = |text: &Option<String>| text.as_deref().map(parse_term).transpose();
        Ok(PatternTerms {
            subject: parse(&self.subject)?,
            predicate: parse(&self.predicate)?,
            object: parse(&self.object)?,
            contexts: self
                .contexts
                .iter()
                .map(|c| parse_term(c))
                .collect::<Result<_>>()?,
            default_graph: self.default_graph,
        })
    }
}

impl PatternTerms {
    fn pattern(&self) -> Pattern<'_> {
        let mut pattern = Pattern::any();
        if let Some(subject) = &self.subject {
            pattern = pattern.subject(subject);
        }
        if let Some(predicate) = &self.predicate {
            pattern = pattern.predicate(predicate);
        }
        if let Some(object) = &self.object {
            pattern = pattern.object(object);
        }
        for context in &self.contexts {
            pattern = pattern.context(context);
        }
        if self.default_graph {
            pattern = pattern.default_graph();
        }
        pattern
    }
}

/// Sets up `env_logger`. The CLI flags win; otherwise `QUADSTORE_LOG`, then
/// `RUST_LOG`, then warnings only.
pub fn init_logging(verbose: bool, debug: bool) {
    let filters = if debug {
        "debug".to_string()
    } else if verbose {
        "info".to_string()
    } else {
        std::env::var("QUADSTORE_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string())
    };
    // a second call (tests running in one process) keeps the first logger
    let _ = env_logger::Builder::new().parse_filters(&filters).try_init();
}

pub fn run() -> Result<()> {
    let cmd = Cli::parse();
    execute(cmd)
}

pub fn run_from_args<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cmd = Cli::try_parse_from(args).map_err(Error::from)?;
    execute(cmd)
}

fn execute(cmd: Cli) -> Result<()> {
    init_logging(cmd.verbose, cmd.debug);

    let config = match &cmd.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?,
        None => StoreConfig::default(),
    };
    if cmd.verbose || cmd.debug {
        config.print();
    }
    if let Commands::Config = cmd.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut store = QuadStore::with_config(config);
    let into = cmd.into.as_deref().map(parse_term).transpose()?;
    for input in &cmd.inputs {
        let added = load_file(&mut store, input, into.as_ref().map(Component::from))
            .with_context(|| format!("Failed to load {}", input.display()))?;
        info!("{}: {} new quads", input.display(), added);
    }

    match cmd.command {
        Commands::Stat { json } => print_stats(&store, json)?,
        Commands::Count { pattern } => {
            let terms = pattern.parse()?;
            println!("{}", store.size(&terms.pattern())?);
        }
        Commands::Query { pattern } => {
            let terms = pattern.parse()?;
            let stdout = std::io::stdout();
            write_nquads(&store, &terms.pattern(), stdout.lock())?;
        }
        Commands::Remove { pattern, output } => {
            let terms = pattern.parse()?;
            let pattern = terms.pattern();
            let before = store.len();
            store.remove(&pattern)?;
            println!("Removed {} quads, {} remain", before - store.len(), store.len());
            if let Some(output) = output {
                let file = File::create(&output)
                    .with_context(|| format!("Failed to create {}", output.display()))?;
                let written = write_nquads(&store, &Pattern::any(), file)?;
                info!("Wrote {} quads to {}", written, output.display());
            }
        }
        Commands::Config => {
            // handled before loading
        }
    }

    Ok(())
}

fn print_stats(store: &QuadStore, json: bool) -> Result<()> {
    let contexts: HashSet<_> = store.quads().map(|quad| quad.quad().context).collect();
    let namespaces: BTreeMap<&str, &str> = store.namespaces().collect();
    if json {
        let stats = serde_json::json!({
            "quads": store.len(),
            "values": store.value_count(),
            "contexts": contexts.len(),
            "namespaces": namespaces,
        });
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    println!("Quads: {}", store.len());
    println!("Values: {}", store.value_count());
    println!("Contexts: {}", contexts.len());
    println!("Namespaces: {}", namespaces.len());
    for (prefix, name) in namespaces {
        println!("  {}: <{}>", prefix, name);
    }
    Ok(())
}
