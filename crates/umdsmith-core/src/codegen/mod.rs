pub mod modules;
pub mod sourcemap;

use crate::bundler::PackageBundler;
use crate::errors::{CompileError, Result};
use crate::fragment::{CoreSource, SourceFragment};
use crate::fs::FileSystem;
use crate::options::CompileOptions;
use crate::provide::path::js_value;
use crate::provide::{CommonJsProvision, ProviderResolver};
pub use sourcemap::{SourceMap, SourceMapBuilder};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the initialization routine that runs the fragments
pub const INIT_FN: &str = "__umdInit";

/// Result of a compilation: the emitted code and, if requested, its source map.
///
/// When a source map is produced it is also appended to `code` as an inline
/// `sourceMappingURL` comment.
#[derive(Debug)]
pub struct CompileOutput {
    pub code: String,
    pub source_map: Option<SourceMap>,
}

/// Module-shape compiler.
///
/// Merges the core library and an ordered list of fragments into a single
/// module loadable as a named module, a CommonJS module or a global.
pub struct Compiler {
    file_system: Arc<dyn FileSystem>,
    bundler: Arc<dyn PackageBundler>,
}

impl Compiler {
    pub fn new(file_system: Arc<dyn FileSystem>, bundler: Arc<dyn PackageBundler>) -> Self {
        Self {
            file_system,
            bundler,
        }
    }

    /// Compile `fragments` into the emitted module text.
    pub fn compile(&self, fragments: &[SourceFragment], options: &CompileOptions) -> Result<String> {
        Ok(self.compile_output(fragments, options)?.code)
    }

    /// Compile and return the source map alongside the code.
    pub fn compile_output(
        &self,
        fragments: &[SourceFragment],
        options: &CompileOptions,
    ) -> Result<CompileOutput> {
        let output_file = options.validate()?;

        info!(
            "Compiling {} fragment(s) into {}",
            fragments.len(),
            output_file.display()
        );

        let resolver = ProviderResolver::new(&options.requires, &options.runtime_var);
        let bundle_dir = options.bundle_dir();

        // Core load and bundling share nothing, run them side by side
        let (core, provision) = rayon::join(
            || self.load_core(&options.core_filename),
            || resolver.common_js(self.bundler.as_ref(), &bundle_dir),
        );
        let core = core?;
        let provision = provision?;

        let emitter = ModuleEmitter::new(options, output_file);
        emitter.emit(&core, fragments, &resolver, &provision)
    }

    fn load_core(&self, path: &Path) -> Result<CoreSource> {
        debug!("Loading core library {}", path.display());
        let content = self
            .file_system
            .read_file(path)
            .map_err(|source| CompileError::CoreLoad {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(CoreSource {
            path: path.to_path_buf(),
            content,
        })
    }
}

/// Text assembly for one compilation. Owns its output buffer.
pub(crate) struct ModuleEmitter<'a> {
    options: &'a CompileOptions,
    output: String,
    indent_level: usize,
    indent_str: &'static str,
    source_map: Option<SourceMapBuilder>,
}

impl<'a> ModuleEmitter<'a> {
    pub(crate) fn new(options: &'a CompileOptions, output_file: &Path) -> Self {
        let source_map = if options.source_map {
            let mut builder = SourceMapBuilder::new();
            if let Some(name) = output_file.file_name() {
                builder.set_file(name.to_string_lossy().to_string());
            }
            Some(builder)
        } else {
            None
        };

        Self {
            options,
            output: String::new(),
            indent_level: 0,
            indent_str: "    ",
            source_map,
        }
    }

    pub(crate) fn emit(
        mut self,
        core: &CoreSource,
        fragments: &[SourceFragment],
        resolver: &ProviderResolver<'_>,
        provision: &CommonJsProvision,
    ) -> Result<CompileOutput> {
        self.writeln("(function (global) {");
        self.emit_core(core);
        self.emit_runtime_setup();
        self.emit_init(fragments);
        self.emit_exports(resolver, provision);
        self.writeln("})(typeof window !== \"undefined\" ? window : global);");

        let source_map = self.source_map.take().map(SourceMapBuilder::build);
        if let Some(map) = &source_map {
            self.output.push_str(&map.to_comment()?);
            self.output.push('\n');
        }

        Ok(CompileOutput {
            code: self.output,
            source_map,
        })
    }

    fn emit_core(&mut self, core: &CoreSource) {
        let label = core.display_path();
        self.marker("begin", &label);
        let source_index = self.register_source(&label, &core.content);
        self.write_verbatim(&core.content, source_index);
        self.marker("end", &label);
    }

    fn emit_runtime_setup(&mut self) {
        let options = self.options;
        let var = &options.runtime_var;
        let setup = [
            format!("var {} = new {}();", var, options.export_name),
            format!("{}.setOptions({});", var, js_value(&options.core_options)),
            format!("{var}.lib = {var}.lib || {{}};"),
        ];
        for line in setup {
            self.line(&line);
        }
    }

    fn emit_init(&mut self, fragments: &[SourceFragment]) {
        self.line(&format!("var {} = function () {{", INIT_FN));
        for fragment in fragments {
            let label = fragment.display_path();
            debug!("Embedding fragment {}", label);

            self.marker("begin", &label);
            if self.options.scope_templates {
                self.line("(function () {");
            }
            let source_index = self.register_source(&label, &fragment.content);
            self.write_verbatim(&fragment.content, source_index);
            if self.options.scope_templates {
                self.line("})();");
            }
            self.marker("end", &label);
        }
        self.line("};");
    }

    /// `// begin: path` / `// end: path` comment
    fn marker(&mut self, kind: &str, label: &str) {
        let label: String = label
            .chars()
            .map(|c| match c {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => ' ',
                c => c,
            })
            .collect();
        self.line(&format!("// {}: {}", kind, label));
    }

    fn register_source(&mut self, label: &str, content: &str) -> Option<usize> {
        self.source_map
            .as_mut()
            .map(|b| b.add_source(label.to_string(), Some(content.to_string())))
    }

    /// Write text unchanged, newline-terminated, mapping each line back to
    /// its origin when a source map is being built.
    fn write_verbatim(&mut self, text: &str, source_index: Option<usize>) {
        for (line_no, line) in text.split_inclusive('\n').enumerate() {
            if let (Some(builder), Some(index)) = (&mut self.source_map, source_index) {
                builder.add_mapping(index, line_no, 0);
            }
            self.write(line);
        }
        if !text.is_empty() && !text.ends_with('\n') {
            self.write("\n");
        }
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
        if let Some(source_map) = &mut self.source_map {
            source_map.advance(s);
        }
    }

    fn writeln(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    /// Indented line
    fn line(&mut self, s: &str) {
        self.write_indent();
        self.writeln(s);
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.write(self.indent_str);
        }
    }
}
