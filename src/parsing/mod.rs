mod model;
mod parser;

pub use model::{DayRecord, IntervalRecord, ParentChildSet};
pub use parser::LogParser;

use std::collections::HashMap;
use std::path::Path;

use crate::domain::ParseError;

/// Loads the top-level category mapping (`{"study": "STUDY", ...}`). A
/// missing or unreadable file is non-fatal; the parser just runs without
/// seeded roots.
#[must_use]
pub fn load_top_level_parents(path: Option<&Path>) -> HashMap<String, String> {
    let Some(path) = path else {
        return HashMap::new();
    };
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => {
            eprintln!(
                "Warning: cannot open configuration file {}. Proceeding without initial parent mappings.",
                path.display()
            );
            return HashMap::new();
        }
    };
    match serde_json::from_str::<HashMap<String, String>>(&content) {
        Ok(mapping) => mapping,
        Err(error) => {
            eprintln!(
                "Warning: failed to parse JSON from {}. Proceeding without initial parent mappings. Details: {}",
                path.display(),
                error
            );
            HashMap::new()
        }
    }
}

/// Parses every file into the shared parser state. Per-file failures are
/// reported and the remaining files still get parsed.
pub fn parse_files(parser: &mut LogParser, paths: &[std::path::PathBuf]) -> Vec<ParseError> {
    let mut errors = Vec::new();
    for path in paths {
        match std::fs::read_to_string(path) {
            Ok(content) => parser.parse_content(&content),
            Err(_) => {
                eprintln!("Error: cannot open file {}", path.display());
                errors.push(ParseError::ErrorReading(path.display().to_string()));
            }
        }
    }
    parser.commit_all();
    errors
}
