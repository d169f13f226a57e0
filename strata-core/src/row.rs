//! Backend-neutral result rows and the forward-only reader.

use std::collections::VecDeque;

use crate::error::{Result, StrataError};
use crate::types::DbValue;

/// Chunk size for blob reads.
const BLOB_CHUNK: usize = 512;

/// How a reader was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Random column access; blob reads are rejected.
    #[default]
    Buffered,
    /// Sequential column access; required for blob reads.
    Sequential,
}

/// One materialized result row. Column lookup is by name and
/// case-insensitive, matching how catalog projections are consumed.
#[derive(Debug, Clone)]
pub struct DataRow {
    columns: Vec<String>,
    values: Vec<DbValue>,
}

impl DataRow {
    /// Create a row from parallel column/value vectors.
    pub fn new(columns: Vec<String>, values: Vec<DbValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Ordinal of a column by name.
    pub fn ordinal(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
    }

    /// Value of a column by name.
    pub fn value(&self, column: &str) -> Option<&DbValue> {
        self.ordinal(column).map(|i| &self.values[i])
    }

    /// Value of a column by ordinal.
    pub fn value_at(&self, index: usize) -> Option<&DbValue> {
        self.values.get(index)
    }

    /// Column names in projection order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Forward-only reader over a statement's result.
///
/// Ownership transfers to the caller when a read is issued; the caller drains
/// or drops it. Blob access requires the reader to have been opened in
/// [`AccessMode::Sequential`].
#[derive(Debug)]
pub struct RowReader {
    mode: AccessMode,
    rows: VecDeque<DataRow>,
    current: Option<DataRow>,
}

impl RowReader {
    /// Create a reader over materialized rows.
    pub fn new(rows: Vec<DataRow>, mode: AccessMode) -> Self {
        Self {
            mode,
            rows: rows.into(),
            current: None,
        }
    }

    /// The access mode the reader was opened with.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Advance to the next row. Returns false once the result is drained.
    pub fn read(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    /// The row the cursor is on, if any.
    pub fn current(&self) -> Option<&DataRow> {
        self.current.as_ref()
    }

    /// Rows not yet visited.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    fn current_value(&self, column: &str) -> Result<&DbValue> {
        let row = self
            .current
            .as_ref()
            .ok_or_else(|| StrataError::query("reader is not positioned on a row"))?;
        row.value(column)
            .ok_or_else(|| StrataError::query(format!("no column named '{}' in result", column)))
    }

    /// String value of a column on the current row; null reads as empty.
    pub fn get_string(&self, column: &str) -> Result<String> {
        Ok(self.current_value(column)?.to_string())
    }

    /// 32-bit integer value of a column on the current row; null reads as 0.
    pub fn get_i32(&self, column: &str) -> Result<i32> {
        let value = self.current_value(column)?;
        if value.is_null() {
            return Ok(0);
        }
        value.as_i32().ok_or_else(|| {
            StrataError::type_conversion(format!("column '{}' is not an integer", column))
        })
    }

    /// 64-bit integer value of a column on the current row; null reads as 0.
    pub fn get_i64(&self, column: &str) -> Result<i64> {
        let value = self.current_value(column)?;
        if value.is_null() {
            return Ok(0);
        }
        value.as_i64().ok_or_else(|| {
            StrataError::type_conversion(format!("column '{}' is not an integer", column))
        })
    }

    /// Boolean flag value of a column on the current row; null reads as
    /// false. Accepts 0/1 integers, which is how catalog queries normalize
    /// nullability and identity flags.
    pub fn get_flag(&self, column: &str) -> Result<bool> {
        let value = self.current_value(column)?;
        if value.is_null() {
            return Ok(false);
        }
        value.as_bool().ok_or_else(|| {
            StrataError::type_conversion(format!("column '{}' is not a flag", column))
        })
    }

    /// Like [`get_flag`](Self::get_flag), but yields `default` when the
    /// column is absent from the projection.
    pub fn get_flag_or(&self, column: &str, default: bool) -> bool {
        match self.current.as_ref().and_then(|row| row.value(column)) {
            Some(value) => value.as_bool().unwrap_or(default),
            None => default,
        }
    }

    /// Read a blob column on the current row in fixed-size chunks.
    ///
    /// Only valid when the reader was opened in sequential-access mode.
    pub fn blob_value(&self, column: &str) -> Result<Vec<u8>> {
        if self.mode != AccessMode::Sequential {
            return Err(StrataError::SequentialAccessRequired);
        }
        let value = self.current_value(column)?;
        let source = match value {
            DbValue::Null => return Ok(Vec::new()),
            DbValue::Bytes(bytes) => bytes.as_slice(),
            DbValue::String(text) => text.as_bytes(),
            _ => {
                return Err(StrataError::type_conversion(format!(
                    "column '{}' is not a blob",
                    column
                )));
            }
        };

        let mut out = vec![0u8; source.len()];
        let mut start = 0;
        while start < source.len() {
            let take = BLOB_CHUNK.min(source.len() - start);
            out[start..start + take].copy_from_slice(&source[start..start + take]);
            start += take;
        }
        Ok(out)
    }

    /// Read a blob column as text. Callers should only use this when they
    /// know the stored bytes are a string.
    pub fn blob_string(&self, column: &str) -> Result<String> {
        let bytes = self.blob_value(column)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_reader(mode: AccessMode) -> RowReader {
        let row = DataRow::new(
            vec!["Id".into(), "Name".into(), "Payload".into()],
            vec![
                DbValue::I32(7),
                DbValue::String("Ann".into()),
                DbValue::Bytes(vec![1u8; 1500]),
            ],
        );
        RowReader::new(vec![row], mode)
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut reader = sample_reader(AccessMode::Buffered);
        assert!(reader.read());
        assert_eq!(reader.get_i32("ID").unwrap(), 7);
        assert_eq!(reader.get_string("name").unwrap(), "Ann");
        assert!(reader.get_string("missing").is_err());
    }

    #[test]
    fn test_forward_only_cursor() {
        let rows = vec![
            DataRow::new(vec!["N".into()], vec![DbValue::I32(1)]),
            DataRow::new(vec!["N".into()], vec![DbValue::I32(2)]),
        ];
        let mut reader = RowReader::new(rows, AccessMode::Buffered);
        assert_eq!(reader.remaining(), 2);
        assert!(reader.read());
        assert_eq!(reader.get_i32("N").unwrap(), 1);
        assert!(reader.read());
        assert_eq!(reader.get_i32("N").unwrap(), 2);
        assert!(!reader.read());
        assert!(reader.current().is_none());
    }

    #[test]
    fn test_blob_requires_sequential_mode() {
        let mut reader = sample_reader(AccessMode::Buffered);
        assert!(reader.read());
        assert!(matches!(
            reader.blob_value("Payload"),
            Err(StrataError::SequentialAccessRequired)
        ));
    }

    #[test]
    fn test_blob_chunked_read_round_trips() {
        let mut reader = sample_reader(AccessMode::Sequential);
        assert!(reader.read());
        let bytes = reader.blob_value("Payload").unwrap();
        assert_eq!(bytes.len(), 1500);
        assert!(bytes.iter().all(|b| *b == 1));
    }

    #[test]
    fn test_blob_string_is_lossy_utf8() {
        let row = DataRow::new(
            vec!["Doc".into()],
            vec![DbValue::Bytes(b"hello".to_vec())],
        );
        let mut reader = RowReader::new(vec![row], AccessMode::Sequential);
        assert!(reader.read());
        assert_eq!(reader.blob_string("Doc").unwrap(), "hello");
    }

    #[test]
    fn test_flag_defaults() {
        let row = DataRow::new(
            vec!["IS_NULLABLE".into()],
            vec![DbValue::I32(1)],
        );
        let mut reader = RowReader::new(vec![row], AccessMode::Buffered);
        assert!(reader.read());
        assert!(reader.get_flag("IS_NULLABLE").unwrap());
        assert!(!reader.get_flag_or("IS_PRIMARY_KEY", false));
    }
}
