use serde::de::DeserializeOwned;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

/// Parse a request document from disk: YAML for `.yaml`/`.yml` files, JSON
/// otherwise.
pub fn read_file<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn Error>> {
    let path = existing_file(path)?;
    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read '{}': {e}", path.display()))?;

    let request = if is_yaml(&path) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("'{}' is not a valid request: {e}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("'{}' is not a valid request: {e}", path.display()))?
    };
    Ok(request)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Relative paths resolve against the working directory.
fn existing_file(path: &str) -> Result<PathBuf, Box<dyn Error>> {
    let mut resolved = PathBuf::from(path);
    if resolved.is_relative() {
        resolved = std::env::current_dir()?.join(resolved);
    }
    if !resolved.is_file() {
        return Err(format!("Input file not found: {}", resolved.display()).into());
    }
    Ok(resolved)
}
