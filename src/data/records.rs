//! JSON-lines record files
//!
//! Each non-empty line holds one JSON object. The text lives under a
//! configurable field (default `text`) and, for labeled files, the class under
//! another (default `klass`):
//!
//! ```text
//! {"text": "me encanta", "klass": "positive"}
//! {"text": "qué horror", "klass": "negative"}
//! ```

use crate::core::{Label, LabeledRecord, Result, SVMError};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Field names and limits used when reading records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
    /// Field holding the text
    pub text_field: String,
    /// Field holding the label
    pub label_field: String,
    /// Stop after this many records
    pub max_items: Option<usize>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            text_field: "text".to_string(),
            label_field: "klass".to_string(),
            max_items: None,
        }
    }
}

impl RecordOptions {
    /// Set the text field name
    pub fn with_text_field(mut self, field: impl Into<String>) -> Self {
        self.text_field = field.into();
        self
    }

    /// Set the label field name
    pub fn with_label_field(mut self, field: impl Into<String>) -> Self {
        self.label_field = field.into();
        self
    }

    /// Cap the number of records read
    pub fn with_max_items(mut self, max_items: Option<usize>) -> Self {
        self.max_items = max_items;
        self
    }
}

/// Reader for labeled and unlabeled record files
#[derive(Debug, Clone, Default)]
pub struct RecordReader {
    options: RecordOptions,
}

impl RecordReader {
    /// Create a reader with the given options
    pub fn new(options: RecordOptions) -> Self {
        Self { options }
    }

    /// Read `(text, label)` records from a file
    pub fn read_labeled<P: AsRef<Path>>(&self, path: P) -> Result<Vec<LabeledRecord>> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        self.read_labeled_from(BufReader::new(file))
    }

    /// Read `(text, label)` records from a reader
    pub fn read_labeled_from<R: BufRead>(&self, reader: R) -> Result<Vec<LabeledRecord>> {
        self.read_with(reader, |object, line| {
            let text = self.text_of(object, line)?;
            let label = self.label_of(object, line)?;
            Ok(LabeledRecord::new(text, label))
        })
    }

    /// Read texts from a file, ignoring any label
    pub fn read_texts<P: AsRef<Path>>(&self, path: P) -> Result<Vec<String>> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        self.read_texts_from(BufReader::new(file))
    }

    /// Read texts from a reader, ignoring any label
    pub fn read_texts_from<R: BufRead>(&self, reader: R) -> Result<Vec<String>> {
        self.read_with(reader, |object, line| self.text_of(object, line))
    }

    fn read_with<R, T, F>(&self, reader: R, mut parse: F) -> Result<Vec<T>>
    where
        R: BufRead,
        F: FnMut(&Map<String, Value>, usize) -> Result<T>,
    {
        let limit = self.options.max_items.unwrap_or(usize::MAX);
        let mut items = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            if items.len() >= limit {
                break;
            }

            let line = line.map_err(|e| match e.kind() {
                ErrorKind::InvalidData => SVMError::MalformedRecord {
                    line: line_num + 1,
                    reason: e.to_string(),
                },
                _ => SVMError::IoError(e),
            })?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let object: Map<String, Value> =
                serde_json::from_str(line).map_err(|e| SVMError::MalformedRecord {
                    line: line_num + 1,
                    reason: e.to_string(),
                })?;
            items.push(parse(&object, line_num + 1)?);
        }

        if items.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        Ok(items)
    }

    fn text_of(&self, object: &Map<String, Value>, line: usize) -> Result<String> {
        match object.get(&self.options.text_field) {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(_) => Err(SVMError::MalformedRecord {
                line,
                reason: format!("field `{}` is not a string", self.options.text_field),
            }),
            None => Err(SVMError::MalformedRecord {
                line,
                reason: format!("missing field `{}`", self.options.text_field),
            }),
        }
    }

    fn label_of(&self, object: &Map<String, Value>, line: usize) -> Result<Label> {
        let value = object
            .get(&self.options.label_field)
            .ok_or_else(|| SVMError::MalformedRecord {
                line,
                reason: format!("missing field `{}`", self.options.label_field),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| SVMError::MalformedRecord {
            line,
            reason: format!(
                "field `{}` must be an integer or a string, got {value}",
                self.options.label_field
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_labeled_basic() {
        let data = "{\"text\": \"good\", \"klass\": \"pos\"}\n\n{\"text\": \"bad\", \"klass\": 0}\n";
        let records = RecordReader::default()
            .read_labeled_from(Cursor::new(data))
            .unwrap();

        assert_eq!(
            records,
            vec![
                LabeledRecord::new("good", Label::from("pos")),
                LabeledRecord::new("bad", Label::Int(0)),
            ]
        );
    }

    #[test]
    fn test_custom_fields_and_limit() {
        let data = "{\"body\": \"a\", \"y\": 1}\n{\"body\": \"b\", \"y\": 2}\n{\"body\": \"c\", \"y\": 3}\n";
        let options = RecordOptions::default()
            .with_text_field("body")
            .with_label_field("y")
            .with_max_items(Some(2));
        let reader = RecordReader::new(options);

        let records = reader.read_labeled_from(Cursor::new(data)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].label, Label::Int(2));

        let texts = reader.read_texts_from(Cursor::new(data)).unwrap();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_texts_ignore_missing_label() {
        let data = "{\"text\": \"uno\"}\n{\"text\": \"dos\", \"klass\": 1.5}\n";
        let texts = RecordReader::default()
            .read_texts_from(Cursor::new(data))
            .unwrap();
        assert_eq!(texts, vec!["uno", "dos"]);
    }

    #[test]
    fn test_malformed_json() {
        let data = "{\"text\": \"ok\", \"klass\": 1}\n{not json}\n";
        let result = RecordReader::default().read_labeled_from(Cursor::new(data));
        assert!(matches!(result, Err(SVMError::MalformedRecord { line: 2, .. })));
    }

    #[test]
    fn test_invalid_utf8_line() {
        let data = b"{\"text\": \"ok\", \"klass\": 1}\n\xff\xfe\n".to_vec();
        let result = RecordReader::default().read_labeled_from(Cursor::new(data));
        assert!(matches!(result, Err(SVMError::MalformedRecord { line: 2, .. })));
    }

    #[test]
    fn test_missing_and_ill_typed_fields() {
        let reader = RecordReader::default();

        let result = reader.read_labeled_from(Cursor::new("{\"text\": \"x\"}\n"));
        assert!(matches!(result, Err(SVMError::MalformedRecord { line: 1, ref reason }) if reason.contains("klass")));

        let result = reader.read_labeled_from(Cursor::new("{\"text\": 3, \"klass\": 1}\n"));
        assert!(matches!(result, Err(SVMError::MalformedRecord { line: 1, .. })));

        let result = reader.read_labeled_from(Cursor::new("{\"text\": \"x\", \"klass\": [1]}\n"));
        assert!(matches!(result, Err(SVMError::MalformedRecord { line: 1, .. })));
    }

    #[test]
    fn test_empty_input() {
        let result = RecordReader::default().read_labeled_from(Cursor::new("\n\n"));
        assert!(matches!(result, Err(SVMError::EmptyDataset)));
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "{{\"text\": \"hola\", \"klass\": \"a\"}}").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let records = RecordReader::default().read_labeled(temp_file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "hola");
    }

    #[test]
    fn test_from_file_io_error() {
        let result = RecordReader::default().read_texts("/non/existent/file.json");
        assert!(matches!(result, Err(SVMError::IoError(_))));
    }
}
