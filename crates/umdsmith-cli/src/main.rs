use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use umdsmith_core::config::{CliOverrides, CompilerConfig, DEFAULT_CONFIG_FILE};
use umdsmith_core::{unwrap_template_body, Container, SourceFragment};

/// umdsmith - Merge a template runtime and its templates into one UMD-style module
#[derive(Parser, Debug, Clone)]
#[command(name = "umdsmith")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Template files, embedded in the order given
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to umdsmith.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    out_file: Option<PathBuf>,

    /// Output directory; bundled packages are resolved from here
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Core runtime library
    #[arg(long, value_name = "FILE")]
    core: Option<PathBuf>,

    /// Canonical export name
    #[arg(long, value_name = "NAME")]
    export_name: Option<String>,

    /// Additional export name (repeatable)
    #[arg(long = "alias", value_name = "NAME")]
    aliases: Vec<String>,

    /// Do not wrap each template in its own scope
    #[arg(long)]
    no_scope: bool,

    /// Append an inline source map to the output
    #[arg(long)]
    inline_source_map: bool,

    /// JSON passed to the runtime's setOptions
    #[arg(long, value_name = "JSON")]
    core_options: Option<String>,

    /// Bundler command used for CommonJS dependencies
    #[arg(long, value_name = "CMD")]
    bundler: Option<String>,

    /// Write a starter umdsmith.yaml
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber
    // Set RUST_LOG=debug for detailed logs
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    if cli.init {
        return init_project(Path::new(DEFAULT_CONFIG_FILE));
    }

    let config = load_config(&cli)?;

    if cli.files.is_empty() {
        bail!("no input files specified, use --help for usage information");
    }

    compile(&cli.files, config)
}

/// Write a starter project file
fn init_project(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    let config = r#"# umdsmith project file

compilerOptions:
  filename: dist/bt.js      # Output file
  coreFilename: lib/bt.js   # Core runtime library
  exportName: BT            # Global name and core constructor
  exportAliases: []         # Extra export names
  scopeTemplates: true      # Wrap each template in its own function
  sourceMap: false          # Append an inline source map
  coreOptions: {}           # Passed to setOptions
  requires: {}
  # requires:
  #   jquery:
  #     globals: jQuery
  #     ym: jquery
  #   lodash:
  #     commonJS: lodash
"#;

    std::fs::write(path, config).with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

/// Load the project file (if any) and apply CLI overrides
fn load_config(cli: &Cli) -> anyhow::Result<CompilerConfig> {
    let mut config = if let Some(ref project_path) = cli.project {
        CompilerConfig::from_file(project_path)
            .with_context(|| format!("failed to load {}", project_path.display()))?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            CompilerConfig::from_file(&default_path)
                .with_context(|| format!("failed to load {}", DEFAULT_CONFIG_FILE))?
        } else {
            CompilerConfig::default()
        }
    };

    let core_options = cli
        .core_options
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .context("--core-options is not valid JSON")?;

    let overrides = CliOverrides {
        filename: cli.out_file.as_ref().map(|p| p.to_string_lossy().to_string()),
        dirname: cli.out_dir.as_ref().map(|p| p.to_string_lossy().to_string()),
        core_filename: cli.core.as_ref().map(|p| p.to_string_lossy().to_string()),
        export_name: cli.export_name.clone(),
        export_aliases: (!cli.aliases.is_empty()).then(|| cli.aliases.clone()),
        scope_templates: cli.no_scope.then_some(false),
        source_map: cli.inline_source_map.then_some(true),
        core_options,
        bundler: cli.bundler.clone(),
    };
    config.merge(&overrides);

    Ok(config)
}

fn compile(files: &[PathBuf], config: CompilerConfig) -> anyhow::Result<()> {
    let container = Container::new(config);
    let options = container.config().to_compile_options()?;
    let output_path = options.validate()?.to_path_buf();

    let fragments = read_fragments(files, &options.bundle_dir())?;
    let output = container.compile(&fragments)?;

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&output_path, &output.code)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    info!("Wrote {}", output_path.display());
    Ok(())
}

/// Read templates in order, dropping their `module.exports` wrappers
fn read_fragments(files: &[PathBuf], base: &Path) -> anyhow::Result<Vec<SourceFragment>> {
    files
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let body = unwrap_template_body(&content).into_owned();

            let fragment = SourceFragment::new(path.clone(), body);
            Ok(match relative_to(path, base) {
                Some(rel) => {
                    debug!("{} -> {}", path.display(), rel);
                    fragment.with_relative_path(rel)
                }
                None => fragment,
            })
        })
        .collect()
}

/// `path` relative to `base`, with `/` separators, when it lies under `base`
fn relative_to(path: &Path, base: &Path) -> Option<String> {
    let path = path.canonicalize().ok()?;
    let base = base.canonicalize().ok()?;
    let rel = path.strip_prefix(&base).ok()?;

    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    Some(parts.join("/"))
}
