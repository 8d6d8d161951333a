//! File persistence for shower trees.

use crate::codec::{decode_collection, encode_collection};
use crate::error::{GraphError, Result};
use crate::types::ShowerNode;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Write every tree to `path`, replacing any existing file.
pub fn write_collection(path: &Path, trees: &[ShowerNode]) -> Result<()> {
    let text = encode_collection(trees)?;
    write_atomically(path, text.as_bytes())?;
    log::info!("Wrote {} shower graphs to {}", trees.len(), path.display());
    Ok(())
}

/// Read every tree stored in `path`.
pub fn read_collection(path: &Path) -> Result<Vec<ShowerNode>> {
    let text = std::fs::read_to_string(path).map_err(|e| GraphError::resource(path, e))?;
    let trees = decode_collection(&text)?;
    log::info!("Read {} shower graphs from {}", trees.len(), path.display());
    Ok(trees)
}

/// Write a single tree to `path`.
pub fn write_graph(path: &Path, tree: &ShowerNode) -> Result<()> {
    write_atomically(path, tree.encode()?.as_bytes())
}

/// Read a file holding exactly one tree.
pub fn read_graph(path: &Path) -> Result<ShowerNode> {
    let text = std::fs::read_to_string(path).map_err(|e| GraphError::resource(path, e))?;
    text.parse()
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| GraphError::resource(parent, e))?;
    }

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, bytes).map_err(|e| GraphError::resource(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| GraphError::resource(path, e))
}
