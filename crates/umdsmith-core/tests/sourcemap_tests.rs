mod common;

use base64::Engine;
use common::{default_compiler, options};
use umdsmith_core::{SourceFragment, SourceMap};

const URL_PREFIX: &str = "//# sourceMappingURL=data:application/json;charset=utf-8;base64,";

#[test]
fn test_inline_source_map_is_appended() {
    let mut options = options();
    options.source_map = true;
    let fragments = vec![SourceFragment::new("blocks/a.js", "bt.lib.a = 1;\nbt.lib.b = 2;\n")];

    let output = default_compiler()
        .compile_output(&fragments, &options)
        .unwrap();
    let map = output.source_map.unwrap();

    assert_eq!(map.version, 3);
    assert_eq!(map.file.as_deref(), Some("out.js"));
    assert_eq!(map.sources, vec!["core.js", "blocks/a.js"]);
    assert_eq!(
        map.sources_content,
        vec![
            Some("function BT() {}\n".to_string()),
            Some("bt.lib.a = 1;\nbt.lib.b = 2;\n".to_string()),
        ]
    );
    // core line 0 at output line 2, fragment lines 0-1 at output lines 10-11
    assert_eq!(map.mappings, ";;AAAA;;;;;;;;ACAA;AACA");

    let last = output.code.trim_end().lines().last().unwrap();
    let encoded = last.strip_prefix(URL_PREFIX).unwrap();
    let json = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    let decoded: SourceMap = serde_json::from_slice(&json).unwrap();
    assert_eq!(decoded.mappings, map.mappings);
    assert_eq!(decoded.sources, map.sources);
}

#[test]
fn test_no_source_map_by_default() {
    let output = default_compiler()
        .compile_output(&[SourceFragment::new("a.js", "x();\n")], &options())
        .unwrap();

    assert!(output.source_map.is_none());
    assert!(!output.code.contains("sourceMappingURL"));
}

#[test]
fn test_source_map_does_not_change_module_text() {
    let fragments = vec![SourceFragment::new("a.js", "x();\n")];
    let plain = default_compiler().compile(&fragments, &options()).unwrap();

    let mut options = options();
    options.source_map = true;
    let mapped = default_compiler().compile(&fragments, &options).unwrap();

    assert!(mapped.starts_with(&plain));
    assert_eq!(mapped[plain.len()..].lines().count(), 1);
}
