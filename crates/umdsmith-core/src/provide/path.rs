//! Helpers for building JavaScript access expressions.

/// Words that cannot be used as a binding name in emitted code.
const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Quote `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    js_value(&serde_json::Value::from(value))
}

/// Serialize `value` as a JavaScript expression.
///
/// JSON leaves U+2028 and U+2029 raw, which engines before ES2019 reject
/// inside string literals.
pub fn js_value(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Split a dotted access path (`"a.b.c"`) into its segments.
///
/// Returns `None` if the path is empty or has an empty segment
/// (`"a..b"`, `".a"`).
pub fn split_dotted(path: &str) -> Option<Vec<String>> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    let segments: Vec<String> = path.split('.').map(|s| s.trim().to_string()).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }

    Some(segments)
}

/// Build a chain of subscript accesses rooted at `root`, one per segment.
///
/// ```
/// use umdsmith_core::provide::path::subscript_chain;
///
/// let segments = vec!["a".to_string(), "b".to_string()];
/// assert_eq!(subscript_chain("global", &segments), r#"global["a"]["b"]"#);
/// ```
pub fn subscript_chain(root: &str, segments: &[String]) -> String {
    let mut out = String::with_capacity(root.len() + segments.len() * 8);
    out.push_str(root);
    for segment in segments {
        out.push('[');
        out.push_str(&js_string(segment));
        out.push(']');
    }
    out
}

/// Whether `name` can be used as a plain JavaScript binding identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return false;
    }
    !RESERVED_WORDS.contains(&name)
}
