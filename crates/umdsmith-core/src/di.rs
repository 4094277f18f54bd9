use crate::bundler::{CommandBundler, PackageBundler};
use crate::codegen::{CompileOutput, Compiler};
use crate::config::CompilerConfig;
use crate::errors::ConfigError;
use crate::fragment::SourceFragment;
use crate::fs::{FileSystem, RealFileSystem};
use std::sync::Arc;

/// Dependency injection container
/// Holds the project configuration and the I/O seams a compiler needs
pub struct Container {
    config: Arc<CompilerConfig>,
    file_system: Arc<dyn FileSystem>,
    bundler: Arc<dyn PackageBundler>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: CompilerConfig) -> Self {
        let config = Arc::new(config);

        let file_system = Arc::new(RealFileSystem::new());
        let bundler = Arc::new(CommandBundler::new(
            config.compiler_options.bundler.clone(),
        ));

        Container {
            config,
            file_system,
            bundler,
        }
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: CompilerConfig,
        file_system: Arc<dyn FileSystem>,
        bundler: Arc<dyn PackageBundler>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            file_system,
            bundler,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<CompilerConfig> {
        &self.config
    }

    /// Get the file system
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Get the package bundler
    pub fn bundler(&self) -> &Arc<dyn PackageBundler> {
        &self.bundler
    }

    /// Wire a compiler to this container's dependencies
    pub fn compiler(&self) -> Compiler {
        Compiler::new(self.file_system.clone(), self.bundler.clone())
    }

    /// Compile `fragments` with the container's configuration
    pub fn compile(&self, fragments: &[SourceFragment]) -> Result<CompileOutput, ConfigError> {
        let options = self.config.to_compile_options()?;
        Ok(self.compiler().compile_output(fragments, &options)?)
    }
}
