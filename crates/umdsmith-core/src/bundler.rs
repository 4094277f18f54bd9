//! External package bundler used to inline CommonJS dependencies.

use crate::errors::BundleError;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Produces one self-contained script for a set of package specifiers.
///
/// Evaluating the returned text must assign a function to a variable named
/// `require` which returns the exports of each requested specifier. This is
/// the shape `browserify -r <pkg>` produces.
pub trait PackageBundler: Send + Sync {
    fn bundle(&self, basedir: &Path, packages: &[String]) -> Result<String, BundleError>;
}

/// Bundler that shells out to a browserify-compatible command.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    program: String,
}

impl CommandBundler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandBundler {
    fn default() -> Self {
        Self::new("browserify")
    }
}

impl PackageBundler for CommandBundler {
    fn bundle(&self, basedir: &Path, packages: &[String]) -> Result<String, BundleError> {
        let mut cmd = Command::new(&self.program);
        cmd.current_dir(basedir);
        for package in packages {
            cmd.arg("-r").arg(package);
        }

        debug!(
            "Running {} in {} for {:?}",
            self.program,
            basedir.display(),
            packages
        );

        let output = cmd.output().map_err(|source| BundleError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(BundleError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| BundleError::InvalidOutput {
            program: self.program.clone(),
        })
    }
}
