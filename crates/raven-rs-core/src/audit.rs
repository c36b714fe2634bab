//! Per-call completion audit files.

use crate::error::RavenCoreError;
use log::debug;
use raven_rs_memory::now_timestamp;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n==========\n\n";
const MAX_NAME_ATTEMPTS: usize = 16;

/// Directory of `<time>_gpt3.txt` files, one per successful completion.
///
/// Write-only: nothing in the turn cycle reads these files back.
#[derive(Debug, Clone)]
pub struct CompletionAuditLog {
    root: PathBuf,
}

impl CompletionAuditLog {
    /// The directory is created on the first write.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist a prompt and its completion, returning the written file.
    pub fn record(&self, prompt: &str, response: &str) -> Result<PathBuf, RavenCoreError> {
        let audit_error = |path: &Path, source| RavenCoreError::Audit {
            path: path.to_path_buf(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(|err| audit_error(&self.root, err))?;

        let mut timestamp = now_timestamp();
        let mut attempts = 0;
        loop {
            attempts += 1;
            let path = self.root.join(format!("{timestamp}_gpt3.txt"));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(format!("{prompt}{SEPARATOR}{response}").as_bytes())
                        .map_err(|err| audit_error(&path, err))?;
                    debug!(
                        "completion audit written (path={}, prompt_len={}, response_len={})",
                        path.display(),
                        prompt.len(),
                        response.len()
                    );
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists && attempts < MAX_NAME_ATTEMPTS => {
                    timestamp += 1e-6;
                }
                Err(err) => return Err(audit_error(&path, err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompletionAuditLog;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_prompt_and_response_with_separator() {
        let temp = tempdir().expect("tempdir");
        let log = CompletionAuditLog::new(temp.path().join("gpt3_logs"));

        let path = log.record("PROMPT", "RESPONSE").expect("record");

        assert!(path.starts_with(log.root()));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.ends_with("_gpt3.txt"));
        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "PROMPT\n\n==========\n\nRESPONSE");
    }

    #[test]
    fn back_to_back_writes_never_collide() {
        let temp = tempdir().expect("tempdir");
        let log = CompletionAuditLog::new(temp.path());

        let first = log.record("a", "1").expect("first");
        let second = log.record("b", "2").expect("second");

        assert_ne!(first, second);
        assert_eq!(fs::read_dir(temp.path()).expect("dir").count(), 2);
    }
}
