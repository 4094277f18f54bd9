//! Source Map v3 output for emitted modules.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

const VLQ_DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// A generated column and the original position it came from
#[derive(Debug, Clone, Copy)]
struct Segment {
    column: usize,
    source: usize,
    line: usize,
    source_column: usize,
}

/// Collects mappings while output is written.
///
/// The builder tracks the generated position itself: every piece of output
/// text must be passed to [`advance`](Self::advance) in order.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    file: Option<String>,
    sources: Vec<String>,
    sources_content: Vec<Option<String>>,
    /// Segments grouped by generated line
    lines: Vec<Vec<Segment>>,
    line: usize,
    column: usize,
}

/// Serialized form of a source map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_file(&mut self, file: String) {
        self.file = Some(file);
    }

    /// Register an original file, returning its index
    pub fn add_source(&mut self, path: String, content: Option<String>) -> usize {
        self.sources.push(path);
        self.sources_content.push(content);
        self.sources.len() - 1
    }

    /// Map the current generated position to `source_line:source_column`
    /// of source `source_index`
    pub fn add_mapping(&mut self, source_index: usize, source_line: usize, source_column: usize) {
        if self.lines.len() <= self.line {
            self.lines.resize_with(self.line + 1, Vec::new);
        }
        self.lines[self.line].push(Segment {
            column: self.column,
            source: source_index,
            line: source_line,
            source_column,
        });
    }

    /// Move the generated position past `text`. Columns count UTF-16 units.
    pub fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.line += 1;
                self.column = 0;
            } else {
                self.column += ch.len_utf16();
            }
        }
    }

    pub fn build(self) -> SourceMap {
        let mappings = self.encode_mappings();
        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            sources_content: self.sources_content,
            names: Vec::new(),
            mappings,
        }
    }

    fn encode_mappings(&self) -> String {
        let mut out = String::new();
        // Source fields are relative across the whole map; the generated
        // column restarts on every line
        let mut prev_source = 0;
        let mut prev_line = 0;
        let mut prev_source_column = 0;

        for (i, segments) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            let mut prev_column = 0;
            for (j, seg) in segments.iter().enumerate() {
                if j > 0 {
                    out.push(',');
                }
                push_vlq(&mut out, delta(seg.column, prev_column));
                push_vlq(&mut out, delta(seg.source, prev_source));
                push_vlq(&mut out, delta(seg.line, prev_line));
                push_vlq(&mut out, delta(seg.source_column, prev_source_column));

                prev_column = seg.column;
                prev_source = seg.source;
                prev_line = seg.line;
                prev_source_column = seg.source_column;
            }
        }
        out
    }
}

fn delta(current: usize, previous: usize) -> i64 {
    current as i64 - previous as i64
}

/// Append `value` as a base64 VLQ: sign in the low bit, 5 bits per digit,
/// least significant group first
fn push_vlq(out: &mut String, value: i64) {
    let mut rest = (value.unsigned_abs() << 1) | u64::from(value < 0);
    loop {
        let mut digit = (rest & 0b1_1111) as usize;
        rest >>= 5;
        if rest != 0 {
            digit |= 0b10_0000;
        }
        out.push(VLQ_DIGITS[digit] as char);
        if rest == 0 {
            break;
        }
    }
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_data_uri(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_vec(self)?;
        Ok(format!(
            "data:application/json;charset=utf-8;base64,{}",
            STANDARD.encode(json)
        ))
    }

    /// `//# sourceMappingURL=` line carrying the whole map
    pub fn to_comment(&self) -> Result<String, serde_json::Error> {
        Ok(format!("//# sourceMappingURL={}", self.to_data_uri()?))
    }
}
