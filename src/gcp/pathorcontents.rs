//! Path-or-contents reader
//!
//! Credential settings may hold either a filesystem path or the literal
//! value itself. A value naming an existing file is replaced by the file's
//! contents; anything else is returned unchanged.

use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;

/// Read `value` as a path if it names an existing file, else as literal contents.
///
/// Returns the contents and whether they came from a file.
pub fn read(value: &str) -> Result<(String, bool)> {
    if value.is_empty() {
        return Ok((String::new(), false));
    }

    let path = expand_home(value)?;

    if path.exists() {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::debug!("Read {} bytes from {}", contents.len(), path.display());
        return Ok((contents, true));
    }

    Ok((value.to_string(), false))
}

/// Expand a leading `~` to the current user's home directory
fn expand_home(value: &str) -> Result<PathBuf> {
    let Some(rest) = value.strip_prefix('~') else {
        return Ok(PathBuf::from(value));
    };

    if !rest.is_empty() && !rest.starts_with('/') && !rest.starts_with('\\') {
        bail!("Cannot expand user-specific home dir");
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot expand '~': no home directory"))?;
    let rest = rest.trim_start_matches(['/', '\\']);
    if rest.is_empty() {
        Ok(home)
    } else {
        Ok(home.join(rest))
    }
}
