//! Build collaborator: compile a Move package into a publishable artifact.
//!
//! Shells out to the external toolchain (`sui move build`) and parses its
//! JSON dump. Build failures are fatal; there is no partial artifact.

use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Compiled module bundle plus dependency package ids, base64-encoded the
/// way the toolchain dumps them. Immutable once produced; consumed by one
/// publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    pub modules: Vec<String>,
    pub dependencies: Vec<String>,
}

/// Invokes the Move toolchain to produce deployment artifacts.
#[derive(Debug, Clone)]
pub struct MoveBuilder {
    /// Skip refreshing git dependencies before building, as deploy scripts
    /// conventionally do.
    skip_fetch_git_deps: bool,
}

impl Default for MoveBuilder {
    fn default() -> Self {
        Self {
            skip_fetch_git_deps: true,
        }
    }
}

impl MoveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_git_deps(mut self, fetch: bool) -> Self {
        self.skip_fetch_git_deps = !fetch;
        self
    }

    /// Compile the package at `path` and return its artifact.
    pub fn compile(&self, path: &Path) -> Result<DeploymentArtifact, DeployError> {
        let mut command = Command::new("sui");
        command
            .arg("move")
            .arg("build")
            .arg("--dump-bytecode-as-base64")
            .arg("--path")
            .arg(path);
        if self.skip_fetch_git_deps {
            command.arg("--skip-fetch-latest-git-deps");
        }

        tracing::debug!(path = %path.display(), "compiling move package");
        let output = command
            .output()
            .map_err(|err| DeployError::Build(format!("failed to run `sui move build`: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DeployError::Build(format!(
                "`sui move build` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        parse_artifact(&output.stdout)
    }
}

fn parse_artifact(stdout: &[u8]) -> Result<DeploymentArtifact, DeployError> {
    serde_json::from_slice(stdout)
        .map_err(|err| DeployError::Build(format!("unreadable build output: {err}")))
}
