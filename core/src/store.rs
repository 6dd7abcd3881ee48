use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// A directory of case files, snapshotted when opened
#[derive(Debug)]
pub struct CaseStore {
    dir: PathBuf,
    names: Vec<String>,
}

impl CaseStore {
    /// Lists the regular files in `dir` whose names don't start with `scratch_prefix`.
    ///
    /// Names are sorted so a fixed directory snapshot always yields the same order.
    pub fn open(dir: impl AsRef<Path>, scratch_prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        let unavailable = |source| Error::StoreUnavailable {
            path: dir.to_path_buf(),
            source,
        };

        let dir = std::fs::canonicalize(dir).map_err(unavailable)?;

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(unavailable)? {
            let entry = entry.map_err(unavailable)?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    log::warn!("skipping non UTF-8 file name {name:?}");
                    continue;
                }
            };

            if !scratch_prefix.is_empty() && name.starts_with(scratch_prefix) {
                log::trace!("skipping scratch file {name}");
                continue;
            }

            // follows symlinks, a link to a case file is a case
            if !entry.path().is_file() {
                log::debug!("skipping {name}, not a file");
                continue;
            }

            names.push(name);
        }
        names.sort();

        Ok(Self { dir, names })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn read(&self, name: &str) -> Result<String> {
        let path = self.dir.join(name);
        std::fs::read_to_string(&path).map_err(|source| Error::ReadCase { path, source })
    }
}
