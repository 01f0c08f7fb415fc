use git2::{BranchType, ErrorCode, Repository};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::analysis::parser::GIT_LOG_FORMAT;
use crate::error::{Error, Result};

/// A repository whose history can be read as raw log text.
#[derive(Debug, Clone)]
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    /// Open a repository, failing with [`Error::SourceUnavailable`] if the
    /// path is not a git work tree.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let requested = path.as_ref().to_path_buf();
        // Open repository in a blocking task since git2 operations are blocking
        let workdir = spawn_blocking(move || -> Result<PathBuf> {
            let repo = Repository::open(&requested).map_err(|e| {
                Error::SourceUnavailable(format!(
                    "{} is not a git repository: {}",
                    requested.display(),
                    e.message()
                ))
            })?;
            Ok(repo
                .workdir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| repo.path().to_path_buf()))
        })
        .await
        .map_err(|e| Error::SourceUnavailable(e.to_string()))??;

        debug!(path = %workdir.display(), "opened repository");
        Ok(Self { path: workdir })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether HEAD points at a commit. A freshly initialized repository
    /// has an unborn HEAD and no history to read.
    pub async fn has_head_commit(&self) -> Result<bool> {
        let path = self.path.clone();
        spawn_blocking(move || -> Result<bool> {
            let repo = Repository::open(&path)?;
            let result = match repo.head() {
                Ok(_) => Ok(true),
                Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            };
            result
        })
        .await
        .map_err(|e| Error::SourceUnavailable(e.to_string()))?
    }

    /// Fail with [`Error::SourceUnavailable`] unless `branch` exists locally.
    pub async fn ensure_branch(&self, branch: &str) -> Result<()> {
        let path = self.path.clone();
        let name = branch.to_string();
        spawn_blocking(move || -> Result<()> {
            let repo = Repository::open(&path)?;
            repo.find_branch(&name, BranchType::Local)
                .map(|_| ())
                .map_err(|_| Error::SourceUnavailable(format!("branch '{name}' does not exist")))
        })
        .await
        .map_err(|e| Error::SourceUnavailable(e.to_string()))?
    }

    /// Raw log text for every commit reachable from `branch`, or from HEAD
    /// when no branch is given. Newest first, as `git log` emits it.
    pub async fn read_log(&self, branch: Option<&str>) -> Result<String> {
        let revision = match branch {
            Some(name) => {
                self.ensure_branch(name).await?;
                format!("refs/heads/{name}")
            }
            None => {
                if !self.has_head_commit().await? {
                    info!("HEAD has no commits yet, history is empty");
                    return Ok(String::new());
                }
                "HEAD".to_string()
            }
        };

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .arg("log")
            .arg(format!("--format={GIT_LOG_FORMAT}"))
            .arg(&revision)
            .arg("--")
            .output()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            return Err(Error::SourceUnavailable(format!(
                "git log {revision} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let raw = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(revision = %revision, bytes = raw.len(), "read git log");
        Ok(raw)
    }
}
