
use std::fs;
use std::path::Path;

use super::error::*;

pub use serde::{Serialize, Deserialize};
pub use serde::de::DeserializeOwned;

///
/// Reads and parses a TOML document from the given file.
///
pub fn read_toml<T: DeserializeOwned> (path: & Path) -> Result<T>
{
    let text = fs::read_to_string(path).context(format!("Failed to read '{}'.", path.display()))?;
    let value = toml::from_str(& text).context(format!("Failed to parse '{}' as TOML.", path.display()))?;
    Ok(value)
}

///
/// Serializes a value to TOML and writes it to the given file, replacing 
/// any previous contents.
///
pub fn write_toml<T: Serialize> (path: & Path, value: & T) -> Result<()>
{
    let text = toml::to_string(value).context(format!("Failed to serialize '{}'.", path.display()))?;
    fs::write(path, text).context(format!("Failed to write '{}'.", path.display()))?;
    Ok(())
}
