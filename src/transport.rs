//! Reading raw content and writing entries for the translation connector

use crate::types::{ContentTree, FlatEntrySet};
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::{Read, Write};

/// Parse one JSON document, trying the SIMD parser first
///
/// Both parsers deserialize into `serde_json::Value`, so object key order is
/// kept either way.
pub fn read_json<R: Read>(mut reader: R) -> Result<Value> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .context("Failed to read input")?;

    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_slice(&content).context("Failed to parse JSON"),
    }
}

/// Writes entry sets and trees to any output
pub struct TransportWriter<W: Write> {
    writer: W,
}

impl<W: Write> TransportWriter<W> {
    pub fn new(writer: W) -> Self {
        TransportWriter { writer }
    }

    /// One JSON object of encoded path to text value
    pub fn write_entries(&mut self, entries: &FlatEntrySet) -> Result<()> {
        let json = serde_json::to_string_pretty(&entries.to_transport())
            .context("Failed to serialize entries")?;
        writeln!(self.writer, "{}", json).context("Failed to write entries")
    }

    /// One `{"path": .., "value": ..}` line per entry, keeping scalar types
    pub fn write_entry_lines(&mut self, entries: &FlatEntrySet) -> Result<()> {
        for (path, value) in entries.iter() {
            let line = json!({
                "path": path.encode(),
                "value": Value::from(value.clone()),
            });
            writeln!(self.writer, "{}", line).context("Failed to write entry")?;
        }
        Ok(())
    }

    pub fn write_tree(&mut self, tree: &ContentTree) -> Result<()> {
        let json = serde_json::to_string_pretty(tree).context("Failed to serialize tree")?;
        writeln!(self.writer, "{}", json).context("Failed to write tree")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlatValue;

    fn sample() -> FlatEntrySet {
        let mut entries = FlatEntrySet::new();
        entries.insert("title".parse().unwrap(), FlatValue::from("Hi"));
        entries.insert("items/0/count".parse().unwrap(), FlatValue::from(2));
        entries
    }

    #[test]
    fn test_write_entries() {
        let mut buffer = Vec::new();
        let mut writer = TransportWriter::new(&mut buffer);
        writer.write_entries(&sample()).unwrap();

        let output: Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(output, json!({"title": "Hi", "items/0/count": "2"}));
    }

    #[test]
    fn test_write_entry_lines() {
        let mut buffer = Vec::new();
        let mut writer = TransportWriter::new(&mut buffer);
        writer.write_entry_lines(&sample()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0], json!({"path": "title", "value": "Hi"}));
        assert_eq!(lines[1], json!({"path": "items/0/count", "value": 2}));
    }

    #[test]
    fn test_read_json_keeps_key_order() {
        let value = read_json(r#"{"zeta": 1, "alpha": {"b": 2, "a": 1}}"#.as_bytes()).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_read_json_rejects_garbage() {
        assert!(read_json("{not json".as_bytes()).is_err());
    }
}
