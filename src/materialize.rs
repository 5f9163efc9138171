// Copyright (c) 2025 - Cowboy AI, Inc.
//! Farm File Materialization
//!
//! Writes one rendered SSH config file per farm into an environment's output
//! directory. The files describe internal topology, so the directory is
//! owner-only (`0700`) and every file is owner read/write (`0600`).
//!
//! A failed farm write is recorded and skipped; the remaining farms are still
//! written. Only a failure to create the directory stops the batch. A farm
//! whose name or address is unsafe is rejected before any path is built, so
//! no inventory record can write outside the output directory.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Farm, RecordError};
use crate::render::render_farm_block;

/// Owner-only directory mode
pub const DIR_MODE: u32 = 0o700;

/// Owner read/write file mode
pub const FILE_MODE: u32 = 0o600;

/// Filesystem errors while writing generated files
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Rejected farm {farm:?}: {source}")]
    Rejected {
        farm: String,
        #[source]
        source: RecordError,
    },
}

/// Result of writing one farm's file
#[derive(Debug)]
pub struct FarmWrite {
    /// Farm name as reported by the inventory
    pub farm: String,

    /// Target file; `None` when the farm was rejected
    pub path: Option<PathBuf>,

    pub result: Result<(), MaterializeError>,
}

impl FarmWrite {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ensure `dir` exists with owner-only permissions
pub fn ensure_private_dir(dir: &Path) -> Result<(), MaterializeError> {
    let create_err = |source| MaterializeError::CreateDir {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(create_err)?;
    set_mode(dir, DIR_MODE).map_err(create_err)?;
    Ok(())
}

/// Replace the whole content of `path`, leaving it owner read/write only
pub fn write_private_file(path: &Path, contents: &str) -> Result<(), MaterializeError> {
    let write_err = |source| MaterializeError::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options.open(path).map_err(write_err)?;
    file.write_all(contents.as_bytes()).map_err(write_err)?;
    file.flush().map_err(write_err)?;

    // `mode` only applies on creation; tighten files left by earlier runs
    set_mode(path, FILE_MODE).map_err(write_err)?;
    Ok(())
}

/// Write `<output_dir>/<farm file name>` for every farm
///
/// Returns one [`FarmWrite`] per farm in input order. Fails as a whole only
/// when the output directory cannot be created.
pub fn write_farm_files(
    output_dir: &Path,
    farms: &[Farm],
) -> Result<Vec<FarmWrite>, MaterializeError> {
    ensure_private_dir(output_dir)?;

    let writes = farms
        .iter()
        .map(|farm| write_farm_file(output_dir, farm))
        .collect();

    Ok(writes)
}

fn write_farm_file(output_dir: &Path, farm: &Farm) -> FarmWrite {
    let rendered = match render_farm_block(farm) {
        Ok(rendered) => rendered,
        Err(source) => {
            warn!("Rejecting farm {:?}: {}", farm.name, source);
            return FarmWrite {
                farm: farm.name.clone(),
                path: None,
                result: Err(MaterializeError::Rejected {
                    farm: farm.name.clone(),
                    source,
                }),
            };
        }
    };

    let path = output_dir.join(farm.file_name());
    let result = write_private_file(&path, &rendered);
    match &result {
        Ok(()) => debug!("Wrote {} ({} cages)", path.display(), farm.cages.len()),
        Err(e) => warn!("Skipping farm {}: {}", farm.name, e),
    }

    FarmWrite {
        farm: farm.name.clone(),
        path: Some(path),
        result,
    }
}

/// Text of an environment index file pulling in every generated farm file
pub fn render_index(output_dir: &Path) -> String {
    format!("Include {}/*.config\n", output_dir.display())
}

/// Write the file an environment's directive includes
pub fn write_index_file(index_path: &Path, output_dir: &Path) -> Result<(), MaterializeError> {
    if let Some(parent) = index_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            ensure_private_dir(parent)?;
        }
    }
    write_private_file(index_path, &render_index(output_dir))
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
