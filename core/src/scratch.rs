use crate::{Error, Result, TestCase, DEFAULT_SCRATCH_PREFIX};
use std::path::PathBuf;

/// How scratch files are named, independent of where they live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchLayout {
    pub prefix: String,
    pub source_ext: String,
    pub output_ext: String,
}

impl Default for ScratchLayout {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_SCRATCH_PREFIX.into(),
            source_ext: "mylang".into(),
            output_ext: "s".into(),
        }
    }
}

impl ScratchLayout {
    pub fn in_dir(&self, dir: impl Into<PathBuf>) -> Scratch {
        Scratch {
            dir: dir.into(),
            layout: self.clone(),
        }
    }
}

/// Harness owned files used to stage each case for the toolchain.
///
/// Every case gets its own file names, all of them carrying the reserved prefix so the case
/// store never picks them up as cases.
#[derive(Debug, Clone)]
pub struct Scratch {
    dir: PathBuf,
    layout: ScratchLayout,
}

impl Scratch {
    fn path(&self, case: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}{case}.{ext}", self.layout.prefix))
    }

    pub fn source_path(&self, case: &str) -> PathBuf {
        self.path(case, &self.layout.source_ext)
    }

    pub fn output_path(&self, case: &str) -> PathBuf {
        self.path(case, &self.layout.output_ext)
    }

    pub fn artifact_path(&self, case: &str) -> PathBuf {
        self.path(case, "out")
    }

    /// Writes the program of `case` to its source path, replacing anything already there
    pub fn stage_source(&self, case: &TestCase) -> Result<PathBuf> {
        let path = self.source_path(&case.name);
        std::fs::write(&path, &case.program_source).map_err(|source| Error::WriteScratch {
            path: path.clone(),
            source,
        })?;
        log::debug!("staged {} at {}", case.name, path.display());
        Ok(path)
    }
}
