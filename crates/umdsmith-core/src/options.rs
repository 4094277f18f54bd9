use crate::errors::CompileError;
use crate::provide::path::is_identifier;
use crate::provide::{is_dep_param, Requirement, BUNDLE_REQUIRE, GLOBAL_ROOT};
use std::path::{Path, PathBuf};

/// Default canonical export name and core constructor
pub const DEFAULT_EXPORT_NAME: &str = "BT";

/// Default name of the runtime variable seen by templates
pub const DEFAULT_RUNTIME_VAR: &str = "bt";

/// Identifiers the emitted wrapper declares or relies on
const WRAPPER_NAMES: &[&str] = &[
    GLOBAL_ROOT,
    BUNDLE_REQUIRE,
    "__umdInit",
    "__umdDefineAsGlobal",
    "modules",
    "module",
    "exports",
    "require",
    "provide",
];

/// Options for one compilation
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Output file path (required)
    pub filename: Option<PathBuf>,
    /// Output directory; the bundler resolves packages from here
    pub dirname: Option<PathBuf>,
    /// Location of the core library
    pub core_filename: PathBuf,
    /// Canonical export name, also the constructor the core library defines
    pub export_name: String,
    /// Runtime variable name inside the emitted closure
    pub runtime_var: String,
    /// Additional names the runtime is exported under
    pub export_aliases: Vec<String>,
    /// Wrap each fragment in its own function scope
    pub scope_templates: bool,
    /// Append an inline source map
    pub source_map: bool,
    /// Value passed to the runtime's `setOptions`
    pub core_options: serde_json::Value,
    /// Declared dependencies, in declaration order
    pub requires: Vec<Requirement>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            filename: None,
            dirname: None,
            core_filename: PathBuf::new(),
            export_name: DEFAULT_EXPORT_NAME.to_string(),
            runtime_var: DEFAULT_RUNTIME_VAR.to_string(),
            export_aliases: Vec::new(),
            scope_templates: true,
            source_map: false,
            core_options: serde_json::Value::Object(serde_json::Map::new()),
            requires: Vec::new(),
        }
    }
}

impl CompileOptions {
    pub fn new(filename: impl Into<PathBuf>, core_filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
            core_filename: core_filename.into(),
            ..Self::default()
        }
    }

    /// Check everything that can be checked without I/O.
    ///
    /// Returns the output file path.
    pub fn validate(&self) -> Result<&Path, CompileError> {
        let filename = self
            .filename
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(CompileError::MissingOutputPath)?;

        if !is_identifier(&self.export_name) {
            return Err(CompileError::InvalidOption {
                option: "exportName",
                reason: format!("`{}` is not a valid identifier", self.export_name),
            });
        }
        if !is_identifier(&self.runtime_var) {
            return Err(CompileError::InvalidOption {
                option: "runtimeVar",
                reason: format!("`{}` is not a valid identifier", self.runtime_var),
            });
        }
        if self.runtime_var == self.export_name {
            return Err(CompileError::InvalidOption {
                option: "runtimeVar",
                reason: "must differ from exportName".to_string(),
            });
        }
        for (option, name) in [
            ("exportName", &self.export_name),
            ("runtimeVar", &self.runtime_var),
        ] {
            if WRAPPER_NAMES.contains(&name.as_str()) {
                return Err(CompileError::InvalidOption {
                    option,
                    reason: format!("`{name}` is used by the module wrapper"),
                });
            }
        }
        if is_dep_param(&self.runtime_var) {
            return Err(CompileError::InvalidOption {
                option: "runtimeVar",
                reason: format!(
                    "`{}` clashes with a named-module handler parameter",
                    self.runtime_var
                ),
            });
        }
        if self.export_aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(CompileError::InvalidOption {
                option: "exportAliases",
                reason: "aliases cannot be empty".to_string(),
            });
        }
        if self.core_filename.as_os_str().is_empty() {
            return Err(CompileError::InvalidOption {
                option: "coreFilename",
                reason: "core library path is required".to_string(),
            });
        }

        for (i, req) in self.requires.iter().enumerate() {
            if self.requires[..i].iter().any(|r| r.name() == req.name()) {
                return Err(CompileError::InvalidRequire {
                    name: req.name().to_string(),
                    reason: "declared more than once".to_string(),
                });
            }
        }

        Ok(filename)
    }

    /// Directory the bundler runs in: `dirname`, else the output file's parent.
    pub fn bundle_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dirname {
            return dir.clone();
        }
        self.filename
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Aliases in order, without duplicates or the canonical name.
    pub fn effective_aliases(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for alias in &self.export_aliases {
            if alias == &self.export_name || out.contains(&alias.as_str()) {
                continue;
            }
            out.push(alias);
        }
        out
    }
}
