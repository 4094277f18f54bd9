//! Loads emitted modules in node under each loader convention.
//! Skipped when `node` is not on PATH.

mod common;

use common::RecordingBundler;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use umdsmith_core::{
    CommandBundler, CompileOptions, Compiler, MockFileSystem, PackageBundler, Requirement,
    SourceFragment,
};

const CORE: &str = r#"function BT() { this.options = null; }
BT.prototype.setOptions = function (options) { this.options = options; };
"#;

fn node_available() -> bool {
    Command::new("node")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn emit(options: &CompileOptions, fragments: &[SourceFragment]) -> String {
    emit_with(Arc::new(CommandBundler::default()), options, fragments)
}

fn emit_with(
    bundler: Arc<dyn PackageBundler>,
    options: &CompileOptions,
    fragments: &[SourceFragment],
) -> String {
    let fs = MockFileSystem::new();
    fs.add_file("core.js", CORE);
    Compiler::new(Arc::new(fs), bundler)
        .compile(fragments, options)
        .unwrap()
}

fn run_node(dir: &Path, script: &str) -> String {
    let output = Command::new("node")
        .current_dir(dir)
        .arg("-e")
        .arg(script)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "node failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn base_options() -> CompileOptions {
    let mut options = CompileOptions::new("out.js", "core.js");
    options.core_options = serde_json::json!({ "escape": false });
    options.export_aliases = vec!["templates".to_string()];
    options
}

fn fragments() -> Vec<SourceFragment> {
    vec![
        SourceFragment::new("a.js", "bt.lib.order = ['a'];\n"),
        SourceFragment::new("b.js", "bt.lib.order.push('b');\n"),
    ]
}

#[test]
fn test_commonjs_export() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.js"), emit(&base_options(), &fragments())).unwrap();

    let stdout = run_node(
        dir.path(),
        r#"const m = require('./out.js');
console.log(JSON.stringify([m.lib.order, m.options, m.templates === m]));"#,
    );

    assert_eq!(stdout, r#"[["a","b"],{"escape":false},true]"#);
}

#[test]
fn test_global_fallback_export() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }

    let mut options = base_options();
    options.requires = vec![Requirement::global("maps", "ya.maps").unwrap()];

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.js"), emit(&options, &fragments())).unwrap();

    let stdout = run_node(
        dir.path(),
        r#"const vm = require('vm');
const code = require('fs').readFileSync('out.js', 'utf8');
const ctx = { ya: { maps: 'MAPS' } };
ctx.global = ctx;
vm.runInNewContext(code, ctx);
console.log(JSON.stringify([ctx.BT.lib.order, ctx.BT.lib.maps, ctx.templates === ctx.BT]));"#,
    );

    assert_eq!(stdout, r#"[["a","b"],"MAPS",true]"#);
}

#[test]
fn test_global_fallback_uses_bundle() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }

    let mut options = base_options();
    options.requires = vec![Requirement::bundled("lodash", "lodash").unwrap()];
    let bundler = Arc::new(RecordingBundler::returning(
        "require=function(n){return {pkg:n};};\n",
    ));

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("out.js"),
        emit_with(bundler, &options, &fragments()),
    )
    .unwrap();

    let stdout = run_node(
        dir.path(),
        r#"const vm = require('vm');
const code = require('fs').readFileSync('out.js', 'utf8');
const ctx = {};
ctx.global = ctx;
vm.runInNewContext(code, ctx);
console.log(JSON.stringify([ctx.BT.lib.order, ctx.BT.lib.lodash, 'require' in ctx]));"#,
    );

    assert_eq!(stdout, r#"[["a","b"],{"pkg":"lodash"},false]"#);
}

#[test]
fn test_named_module_export() {
    if !node_available() {
        eprintln!("skipping: node not found");
        return;
    }

    let mut options = base_options();
    options.requires = vec![Requirement::new(
        "jquery",
        vec![umdsmith_core::Provider::NamedModule {
            module: "jquery".to_string(),
        }],
    )
    .unwrap()];

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("out.js"), emit(&options, &fragments())).unwrap();

    let stdout = run_node(
        dir.path(),
        r#"const vm = require('vm');
const code = require('fs').readFileSync('out.js', 'utf8');
const defined = {};
const modules = {
  define(name, deps, fn) { defined[name] = { deps, fn }; },
  require(name) {
    const d = defined[name];
    let value;
    const args = d.deps.map((dep) => dep === 'jquery' ? 'JQ' : modules.require(dep));
    d.fn((v) => { value = v; }, ...args);
    return value;
  },
};
const ctx = { modules };
ctx.global = ctx;
vm.runInNewContext(code, ctx);
const bt = modules.require('BT');
console.log(JSON.stringify([bt.lib.order, bt.lib.jquery, modules.require('templates') === bt, 'BT' in ctx]));"#,
    );

    assert_eq!(stdout, r#"[["a","b"],"JQ",true,false]"#);
}
