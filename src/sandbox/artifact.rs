// src/sandbox/artifact.rs

//! Per-execution script artifact.
//!
//! Every execution gets its own freshly created directory holding
//! `submission.py`. The directory doubles as the child's working directory,
//! so anything the submission writes next to itself goes away with it.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

/// File name of the wrapped program inside the artifact directory.
pub const SCRIPT_FILE_NAME: &str = "submission.py";

const DIR_PREFIX: &str = "codefarm-";

/// A uniquely named directory containing one wrapped program.
///
/// Dropping the artifact removes the directory (via `TempDir`), so early
/// returns and panics cannot leak it; [`ScriptArtifact::cleanup`] does the
/// same but reports failures to the log.
#[derive(Debug)]
pub struct ScriptArtifact {
    dir: TempDir,
    script: PathBuf,
}

impl ScriptArtifact {
    /// Create a new artifact under `base_dir` (or the system temp dir).
    pub fn create(base_dir: Option<&Path>, source: &str) -> std::io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(DIR_PREFIX);

        let dir = match base_dir {
            Some(base) => {
                fs::create_dir_all(base)?;
                builder.tempdir_in(base)?
            }
            None => builder.tempdir()?,
        };

        let script = dir.path().join(SCRIPT_FILE_NAME);
        fs::write(&script, source)?;

        debug!(artifact = %script.display(), bytes = source.len(), "wrote script artifact");
        Ok(Self { dir, script })
    }

    pub fn script_path(&self) -> &Path {
        &self.script
    }

    pub fn dir_path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the artifact. Failures are logged, never returned.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(artifact = %path.display(), "removed script artifact"),
            Err(e) => warn!(
                artifact = %path.display(),
                error = %e,
                "failed to remove script artifact"
            ),
        }
    }
}
