//! Store configuration: starting table sizes and the default-graph IRI.
//! Stored as JSON so tools can keep it next to their data.

use crate::consts::{
    DEFAULT_GRAPH, DEFAULT_STATEMENT_CAPACITY, DEFAULT_VALUE_CAPACITY, MIN_TABLE_CAPACITY,
};
use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Write};
use std::path::Path;

fn default_value_capacity() -> usize {
    DEFAULT_VALUE_CAPACITY
}

fn default_statement_capacity() -> usize {
    DEFAULT_STATEMENT_CAPACITY
}

fn default_graph() -> String {
    DEFAULT_GRAPH.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    // initial number of slots in the value hash table
    #[serde(default = "default_value_capacity")]
    pub value_capacity: usize,
    // initial number of slots in the statement hash table; clear() shrinks back to it
    #[serde(default = "default_statement_capacity")]
    pub statement_capacity: usize,
    // IRI standing in for the default graph
    #[serde(default = "default_graph")]
    pub default_graph: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            value_capacity: DEFAULT_VALUE_CAPACITY,
            statement_capacity: DEFAULT_STATEMENT_CAPACITY,
            default_graph: DEFAULT_GRAPH.to_string(),
        }
    }
}

/// Rounds a requested capacity to the power of two the tables use.
pub(crate) fn table_capacity(requested: usize) -> usize {
    requested
        .max(MIN_TABLE_CAPACITY)
        .checked_next_power_of_two()
        .unwrap_or(MIN_TABLE_CAPACITY)
}

impl StoreConfig {
    pub fn with_capacities(value_capacity: usize, statement_capacity: usize) -> Self {
        StoreConfig {
            value_capacity,
            statement_capacity,
            ..Default::default()
        }
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        let config: StoreConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    /// Prints the configuration for command line output.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  Value table capacity: {}", table_capacity(self.value_capacity));
        println!(
            "  Statement table capacity: {}",
            table_capacity(self.statement_capacity)
        );
        println!("  Default graph: <{}>", self.default_graph);
    }
}
