pub mod file;
pub mod stdin;

use serde_json::Value;

/// The command's JSON document: `--input <file>` wins over piped stdin.
pub fn read_document(path: Option<&str>) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    match path {
        Some(p) => file::read_json_value(p).map(Some),
        None => stdin::read_stdin(),
    }
}
