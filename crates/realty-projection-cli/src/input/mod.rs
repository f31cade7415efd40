pub mod file;
pub mod stdin;

use serde::de::DeserializeOwned;
use std::error::Error;

/// Request from `--input <file>` (JSON or YAML) when given, otherwise from
/// piped JSON on stdin.
pub fn read_request<T: DeserializeOwned>(path: Option<&str>) -> Result<Option<T>, Box<dyn Error>> {
    match path {
        Some(p) => file::read_file(p).map(Some),
        None => stdin::read_stdin(),
    }
}
