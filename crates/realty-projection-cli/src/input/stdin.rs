use serde::de::DeserializeOwned;
use std::error::Error;
use std::io::{self, Read};

/// Parse a JSON request piped on stdin. `None` when stdin is a terminal or
/// the pipe is empty.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let request = serde_json::from_str(trimmed)
        .map_err(|e| format!("stdin is not a valid request: {e}"))?;
    Ok(Some(request))
}
