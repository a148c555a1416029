use super::BuildError;
use crate::fs::FileSystem;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Every regular file under `root`.
///
/// A missing root yields nothing, a file yields itself and a directory yields
/// its whole subtree without the directories themselves.
pub fn expand(fs: &dyn FileSystem, root: &Path) -> Result<BTreeSet<PathBuf>, BuildError> {
    if !fs.exists(root) {
        return Ok(BTreeSet::new());
    }
    if fs.is_file(root) {
        return Ok(BTreeSet::from([root.to_path_buf()]));
    }
    if !fs.is_dir(root) {
        return Ok(BTreeSet::new());
    }

    let files = fs.walk_files(root).map_err(|source| BuildError::Expand {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(files.into_iter().collect())
}
