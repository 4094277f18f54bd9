pub mod bundler;
pub mod codegen;
pub mod config;
pub mod di;
pub mod errors;
pub mod fragment;
pub mod fs;
pub mod options;
pub mod provide;

pub use bundler::{CommandBundler, PackageBundler};
pub use codegen::{CompileOutput, Compiler, SourceMap};
pub use config::{CliOverrides, CompilerConfig, DependencySpec};
pub use di::Container;
pub use errors::{BundleError, CompileError, ConfigError};
pub use fragment::{unwrap_template_body, CoreSource, SourceFragment};
pub use fs::{FileSystem, MockFileSystem, RealFileSystem};
pub use options::CompileOptions;
pub use provide::{Branch, Provider, Requirement};
