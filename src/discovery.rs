//! Input discovery: a flat listing of the files a run will process.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::error::SetupError;
use crate::state_machine::WorkItem;

/// List the regular files in `dir` whose name ends with `suffix`.
///
/// Subdirectories are not descended into and entries keep the order the
/// filesystem returns them in. A missing directory and a directory without
/// matches are both setup errors, reported as distinct variants.
pub fn enumerate(dir: &Path, suffix: &str) -> Result<Vec<WorkItem>, SetupError> {
    let io_err = |source| SetupError::Io {
        path: dir.to_path_buf(),
        source,
    };

    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Err(SetupError::DirectoryNotFound(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SetupError::DirectoryNotFound(dir.to_path_buf()));
        }
        Err(e) => return Err(io_err(e)),
    }

    let mut items = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if !path.is_file() {
            continue;
        }
        if path.file_name().is_some_and(|name| matches_suffix(name, suffix)) {
            items.push(WorkItem::new(path));
        }
    }

    if items.is_empty() {
        return Err(SetupError::EmptyInputSet {
            dir: dir.to_path_buf(),
            suffix: suffix.to_string(),
        });
    }

    debug!(dir = %dir.display(), count = items.len(), "enumerated input files");
    Ok(items)
}

fn matches_suffix(name: &OsStr, suffix: &str) -> bool {
    name.to_string_lossy().ends_with(suffix)
}
