//! Generic durable CSV table.
//!
//! A [`Table`] persists one fixed record schema as a comma-separated text
//! file: a mandatory header row followed by one row per record. All writes
//! follow crash-only design: the table is rewritten in full to a temp file
//! in the same directory, fsynced, then atomically renamed over the
//! original. A crash before the rename leaves the previous table
//! byte-for-byte untouched.
//!
//! Mutations (`upsert`/`delete`) are serialized by one mutex per table
//! instance. Reads take no lock: because replacement is a single atomic
//! rename, a concurrent reader always parses either the pre- or the
//! post-mutation file, never a mixture.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;

/// A record that can live in a [`Table`].
///
/// `key` must be unique within a table; `upsert` and `delete` match on it.
pub trait Record: Clone + Send + Sync + 'static {
    /// Column names of the header row, in order.
    const HEADER: &'static [&'static str];

    /// The unique key field of this record.
    fn key(&self) -> &str;

    /// Serialize to one CSV row, in header order.
    fn encode(&self) -> Vec<String>;

    /// Parse from one CSV row.
    fn decode(fields: &[String]) -> anyhow::Result<Self>;
}

/// A durable table of records of one schema.
pub struct Table<R> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _marker: PhantomData<R>,
}

impl<R: Record> Table<R> {
    /// Open the table at `path`, creating it with the header row only if it
    /// does not exist. Idempotent.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let table = Self {
            path,
            write_lock: Mutex::new(()),
            _marker: PhantomData,
        };
        if !table.path.exists() {
            table.rewrite(&[])?;
        }
        Ok(table)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All current records, in table order. Lock-free snapshot read.
    pub fn list(&self) -> anyhow::Result<Vec<R>> {
        Self::read_records(&self.path)
    }

    /// Look up a single record by key. Lock-free.
    pub fn get(&self, key: &str) -> anyhow::Result<Option<R>> {
        Ok(self.list()?.into_iter().find(|r| r.key() == key))
    }

    /// Whether a record with `key` exists. Lock-free.
    pub fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.list()?.iter().any(|r| r.key() == key))
    }

    /// Whether the table holds no records. Lock-free.
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.list()?.is_empty())
    }

    /// Insert or replace the record whose key matches `record.key()`.
    ///
    /// An existing row is overwritten in place (its position in the table
    /// is unchanged); a new row is appended at the end.
    pub fn upsert(&self, record: R) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().expect("mutex poisoned");
        let mut records = Self::read_records(&self.path)?;
        match records.iter_mut().find(|r| r.key() == record.key()) {
            Some(slot) => *slot = record,
            None => records.push(record),
        }
        self.rewrite(&records)
    }

    /// Remove the record with `key`. No-op if the key is absent.
    pub fn delete(&self, key: &str) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().expect("mutex poisoned");
        let mut records = Self::read_records(&self.path)?;
        let before = records.len();
        records.retain(|r| r.key() != key);
        if records.len() == before {
            return Ok(());
        }
        self.rewrite(&records)
    }

    /// Write a complete replacement file and atomically rename it over the
    /// original. The single correctness-critical protocol of the catalog.
    fn rewrite(&self, records: &[R]) -> anyhow::Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("table path has no parent: {}", self.path.display()))?;
        let mut temp = NamedTempFile::new_in(parent)?;
        {
            let file = temp.as_file_mut();
            let header: Vec<String> = R::HEADER.iter().map(|h| h.to_string()).collect();
            writeln!(file, "{}", encode_row(&header))?;
            for record in records {
                writeln!(file, "{}", encode_row(&record.encode()))?;
            }
            file.flush()?;
            file.sync_all()?; // fsync before the rename makes the rewrite durable
        }
        temp.persist(&self.path)?;
        Ok(())
    }

    fn read_records(path: &Path) -> anyhow::Result<Vec<R>> {
        let contents = std::fs::read_to_string(path)?;
        let mut rows = parse_csv(&contents);
        if rows.is_empty() {
            anyhow::bail!("table file {} is missing its header row", path.display());
        }
        let header = rows.remove(0);
        if header.iter().map(String::as_str).ne(R::HEADER.iter().copied()) {
            anyhow::bail!(
                "table file {} has unexpected header: {:?}",
                path.display(),
                header
            );
        }
        rows.iter().map(|fields| R::decode(fields)).collect()
    }
}

// -- CSV encoding -------------------------------------------------------------

/// Encode one row, quoting fields that contain a comma, quote, or newline.
fn encode_row(fields: &[String]) -> String {
    let encoded: Vec<String> = fields
        .iter()
        .map(|f| {
            if f.contains(',') || f.contains('"') || f.contains('\n') || f.contains('\r') {
                format!("\"{}\"", f.replace('"', "\"\""))
            } else {
                f.clone()
            }
        })
        .collect();
    encoded.join(",")
}

/// Parse CSV text into rows of fields. Quoted fields may contain commas,
/// doubled quotes, and newlines. Blank lines are skipped.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => {
                row.push(std::mem::take(&mut field));
            }
            '\r' => {
                // Swallowed; the following '\n' terminates the row.
            }
            '\n' => {
                if !row.is_empty() || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
            }
            _ => field.push(c),
        }
    }
    if !row.is_empty() || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq)]
    struct PairRecord {
        name: String,
        value: String,
    }

    impl Record for PairRecord {
        const HEADER: &'static [&'static str] = &["Name", "Value"];

        fn key(&self) -> &str {
            &self.name
        }

        fn encode(&self) -> Vec<String> {
            vec![self.name.clone(), self.value.clone()]
        }

        fn decode(fields: &[String]) -> anyhow::Result<Self> {
            anyhow::ensure!(fields.len() == 2, "expected 2 fields, got {}", fields.len());
            Ok(PairRecord {
                name: fields[0].clone(),
                value: fields[1].clone(),
            })
        }
    }

    fn pair(name: &str, value: &str) -> PairRecord {
        PairRecord {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    fn test_table() -> (Table<PairRecord>, TempDir) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let table = Table::open(tmp.path().join("pairs.csv")).expect("failed to open table");
        (table, tmp)
    }

    #[test]
    fn test_open_creates_header_only_file() {
        let (table, _tmp) = test_table();
        let contents = std::fs::read_to_string(table.path()).unwrap();
        assert_eq!(contents, "Name,Value\n");
        assert!(table.is_empty().unwrap());
    }

    #[test]
    fn test_open_is_idempotent() {
        let (table, _tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();

        // Reopening must not truncate existing data.
        let reopened: Table<PairRecord> = Table::open(table.path()).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_appends_then_replaces_in_place() {
        let (table, _tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();
        table.upsert(pair("b", "2")).unwrap();
        table.upsert(pair("c", "3")).unwrap();

        // Replacing "a" keeps its position at the head of the table.
        table.upsert(pair("a", "updated")).unwrap();
        let records = table.list().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], pair("a", "updated"));
        assert_eq!(records[1], pair("b", "2"));
        assert_eq!(records[2], pair("c", "3"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let (table, _tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();
        table.upsert(pair("a", "1")).unwrap();

        let records = table.list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], pair("a", "1"));

        // Exactly one header row and one record row on disk.
        let contents = std::fs::read_to_string(table.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_delete_removes_and_is_noop_when_absent() {
        let (table, _tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();
        table.upsert(pair("b", "2")).unwrap();

        table.delete("a").unwrap();
        assert!(!table.exists("a").unwrap());
        assert!(table.exists("b").unwrap());

        // Deleting a missing key is not an error.
        table.delete("no-such-key").unwrap();
        assert_eq!(table.list().unwrap().len(), 1);
    }

    #[test]
    fn test_get() {
        let (table, _tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();

        assert_eq!(table.get("a").unwrap(), Some(pair("a", "1")));
        assert_eq!(table.get("b").unwrap(), None);
    }

    #[test]
    fn test_fields_with_commas_quotes_and_newlines_roundtrip() {
        let (table, _tmp) = test_table();
        table.upsert(pair("k1", "a,b,c")).unwrap();
        table.upsert(pair("k2", "she said \"hi\"")).unwrap();
        table.upsert(pair("k3", "line1\nline2")).unwrap();

        let records = table.list().unwrap();
        assert_eq!(records[0].value, "a,b,c");
        assert_eq!(records[1].value, "she said \"hi\"");
        assert_eq!(records[2].value, "line1\nline2");
    }

    #[test]
    fn test_crash_before_rename_leaves_table_untouched() {
        let (table, tmp) = test_table();
        table.upsert(pair("a", "1")).unwrap();
        table.upsert(pair("b", "2")).unwrap();
        let snapshot = std::fs::read(table.path()).unwrap();

        // Simulate a rewrite that died before the rename: a stray temp file
        // with partial content sits next to the table.
        let stray = tmp.path().join(".tmpdeadbeef");
        std::fs::write(&stray, "Name,Value\na,CORRU").unwrap();

        // The original is byte-identical and still fully parseable.
        assert_eq!(std::fs::read(table.path()).unwrap(), snapshot);
        let reopened: Table<PairRecord> = Table::open(table.path()).unwrap();
        assert_eq!(reopened.list().unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_upserts_do_not_corrupt_the_table() {
        let (table, _tmp) = test_table();
        let table = Arc::new(table);

        let mut handles = Vec::new();
        for i in 0..8 {
            let table = Arc::clone(&table);
            handles.push(std::thread::spawn(move || {
                for j in 0..4 {
                    table
                        .upsert(pair(&format!("key-{i}-{j}"), &format!("v{j}")))
                        .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Exactly one header row and 32 distinct, parseable records.
        let records = table.list().unwrap();
        assert_eq!(records.len(), 32);
        let contents = std::fs::read_to_string(table.path()).unwrap();
        assert_eq!(contents.lines().count(), 33);
        assert_eq!(contents.lines().next(), Some("Name,Value"));
    }

    #[test]
    fn test_reader_sees_consistent_snapshot_during_mutation() {
        let (table, _tmp) = test_table();
        let table = Arc::new(table);
        for i in 0..10 {
            table.upsert(pair(&format!("k{i}"), "seed")).unwrap();
        }

        let writer = {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                for round in 0..20 {
                    for i in 0..10 {
                        table
                            .upsert(pair(&format!("k{i}"), &format!("round-{round}")))
                            .unwrap();
                    }
                }
            })
        };

        // Every read parses cleanly and sees all 10 keys.
        for _ in 0..50 {
            let records = table.list().unwrap();
            assert_eq!(records.len(), 10);
        }
        writer.join().unwrap();
    }

    #[test]
    fn test_mismatched_header_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pairs.csv");
        std::fs::write(&path, "Wrong,Header\n").unwrap();

        let table: Table<PairRecord> = Table::open(&path).unwrap();
        assert!(table.list().is_err());
    }

    #[test]
    fn test_parse_csv_edge_cases() {
        assert_eq!(parse_csv(""), Vec::<Vec<String>>::new());
        assert_eq!(parse_csv("a,b\n"), vec![vec!["a".to_string(), "b".to_string()]]);
        assert_eq!(
            parse_csv("a,\n"),
            vec![vec!["a".to_string(), String::new()]]
        );
        assert_eq!(
            parse_csv("\"a,b\",c\r\n"),
            vec![vec!["a,b".to_string(), "c".to_string()]]
        );
        assert_eq!(
            parse_csv("\"he said \"\"hi\"\"\"\n"),
            vec![vec!["he said \"hi\"".to_string()]]
        );
        // Blank lines are skipped.
        assert_eq!(
            parse_csv("a\n\nb\n"),
            vec![vec!["a".to_string()], vec!["b".to_string()]]
        );
    }
}
