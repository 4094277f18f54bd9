use crate::errors::{CompileError, ConfigError};
use crate::options::{CompileOptions, DEFAULT_EXPORT_NAME, DEFAULT_RUNTIME_VAR};
use crate::provide::path::split_dotted;
use crate::provide::{Provider, Requirement};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default project file name
pub const DEFAULT_CONFIG_FILE: &str = "umdsmith.yaml";

/// How one dependency can be obtained, as written in the project file.
///
/// Converted into [`Requirement`] before compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    /// Dotted path on the global object, e.g. `jQuery` or `ya.maps`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub globals: Option<String>,

    /// CommonJS package specifier to bundle
    #[serde(default, rename = "commonJS", skip_serializing_if = "Option::is_none")]
    pub common_js: Option<String>,

    /// Named-module system module name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ym: Option<String>,
}

impl DependencySpec {
    pub fn to_requirement(&self, name: &str) -> Result<Requirement, CompileError> {
        let mut providers = Vec::new();

        if let Some(module) = &self.ym {
            providers.push(Provider::NamedModule {
                module: module.clone(),
            });
        }
        if let Some(package) = &self.common_js {
            providers.push(Provider::Bundled {
                package: package.clone(),
            });
        }
        if let Some(dotted) = &self.globals {
            let segments = split_dotted(dotted).ok_or_else(|| CompileError::InvalidRequire {
                name: name.to_string(),
                reason: format!("invalid global path `{dotted}`"),
            })?;
            providers.push(Provider::GlobalPath { segments });
        }

        Requirement::new(name, providers)
    }
}

/// Compiler options as read from the project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Output file
    #[serde(default)]
    pub filename: Option<String>,

    /// Output directory used to resolve bundled packages
    #[serde(default)]
    pub dirname: Option<String>,

    /// Core library location
    #[serde(default)]
    pub core_filename: Option<String>,

    /// Canonical export name (default: BT)
    #[serde(default = "default_export_name")]
    pub export_name: String,

    /// Runtime variable used by templates (default: bt)
    #[serde(default = "default_runtime_var")]
    pub runtime_var: String,

    /// Additional export names
    #[serde(default)]
    pub export_aliases: Vec<String>,

    /// Wrap each template in its own scope (default: true)
    #[serde(default = "default_true")]
    pub scope_templates: bool,

    /// Append an inline source map (default: false)
    #[serde(default)]
    pub source_map: bool,

    /// Passed to the runtime's setOptions
    #[serde(default = "default_core_options")]
    pub core_options: serde_json::Value,

    /// Dependencies by logical name
    #[serde(default)]
    pub requires: IndexMap<String, DependencySpec>,

    /// Bundler executable (default: browserify)
    #[serde(default = "default_bundler")]
    pub bundler: String,
}

fn default_true() -> bool {
    true
}

fn default_export_name() -> String {
    DEFAULT_EXPORT_NAME.to_string()
}

fn default_runtime_var() -> String {
    DEFAULT_RUNTIME_VAR.to_string()
}

fn default_core_options() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_bundler() -> String {
    "browserify".to_string()
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            filename: None,
            dirname: None,
            core_filename: None,
            export_name: default_export_name(),
            runtime_var: default_runtime_var(),
            export_aliases: Vec::new(),
            scope_templates: true,
            source_map: false,
            core_options: default_core_options(),
            requires: IndexMap::new(),
            bundler: default_bundler(),
        }
    }
}

/// CLI flags that take precedence over the project file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub filename: Option<String>,
    pub dirname: Option<String>,
    pub core_filename: Option<String>,
    pub export_name: Option<String>,
    /// Replaces the file's aliases when set
    pub export_aliases: Option<Vec<String>>,
    pub scope_templates: Option<bool>,
    pub source_map: Option<bool>,
    pub core_options: Option<serde_json::Value>,
    pub bundler: Option<String>,
}

/// Main project configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerConfig {
    #[serde(default)]
    pub compiler_options: CompilerOptions,
}

impl CompilerConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid, default configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let opts = &mut self.compiler_options;

        if let Some(filename) = &overrides.filename {
            opts.filename = Some(filename.clone());
        }
        if let Some(dirname) = &overrides.dirname {
            opts.dirname = Some(dirname.clone());
        }
        if let Some(core) = &overrides.core_filename {
            opts.core_filename = Some(core.clone());
        }
        if let Some(name) = &overrides.export_name {
            opts.export_name = name.clone();
        }
        if let Some(aliases) = &overrides.export_aliases {
            opts.export_aliases = aliases.clone();
        }
        if let Some(scope) = overrides.scope_templates {
            opts.scope_templates = scope;
        }
        if let Some(source_map) = overrides.source_map {
            opts.source_map = source_map;
        }
        if let Some(core_options) = &overrides.core_options {
            opts.core_options = core_options.clone();
        }
        if let Some(bundler) = &overrides.bundler {
            opts.bundler = bundler.clone();
        }
    }

    /// Build compile options; requirement entries are validated here.
    ///
    /// Missing paths are left for [`CompileOptions::validate`] to report.
    pub fn to_compile_options(&self) -> Result<CompileOptions, ConfigError> {
        let opts = &self.compiler_options;

        let requires = opts
            .requires
            .iter()
            .map(|(name, dep)| dep.to_requirement(name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompileOptions {
            filename: opts.filename.as_ref().map(PathBuf::from),
            dirname: opts.dirname.as_ref().map(PathBuf::from),
            core_filename: opts
                .core_filename
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_default(),
            export_name: opts.export_name.clone(),
            runtime_var: opts.runtime_var.clone(),
            export_aliases: opts.export_aliases.clone(),
            scope_templates: opts.scope_templates,
            source_map: opts.source_map,
            core_options: opts.core_options.clone(),
            requires,
        })
    }
}
