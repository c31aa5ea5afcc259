// 📜 History Store - Append-only log of past calculations
// The whole log lives in one JSON file, rewritten on every append

use crate::calculator::GrossResult;
use crate::error::HistoryError;
use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Timestamp layout used in the persisted file
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ============================================================================
// RECORD
// ============================================================================

/// One completed calculation, as persisted.
///
/// Field names are kept from the files the earlier desktop tool wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    #[serde(rename = "data", with = "timestamp_format")]
    pub timestamp: NaiveDateTime,

    #[serde(rename = "valor_desejado")]
    pub desired_net: f64,

    #[serde(rename = "modalidade")]
    pub modality_label: String,

    #[serde(rename = "valor_cobrar")]
    pub gross: f64,

    #[serde(rename = "valor_recebido")]
    pub net_received: f64,
}

impl CalculationRecord {
    /// Record a result at an explicit time, truncated to whole seconds
    pub fn from_result(result: &GrossResult, timestamp: NaiveDateTime) -> Self {
        CalculationRecord {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            desired_net: result.desired_net,
            modality_label: result.label(),
            gross: result.gross,
            net_received: result.net_received,
        }
    }

    /// Record a result stamped with the current local time
    pub fn now(result: &GrossResult) -> Self {
        Self::from_result(result, Local::now().naive_local())
    }

    pub fn is_finite(&self) -> bool {
        self.desired_net.is_finite() && self.gross.is_finite() && self.net_received.is_finite()
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug)]
enum StoreState {
    Uninitialized,
    Loaded(Vec<CalculationRecord>),
}

/// File-backed history log. Single process, single writer.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    state: StoreState,
}

impl HistoryStore {
    /// Point a store at `path`; nothing is read until `load`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        HistoryStore {
            path: path.as_ref().to_path_buf(),
            state: StoreState::Uninitialized,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, StoreState::Loaded(_))
    }

    /// Read the persisted log.
    ///
    /// A missing file and a file that does not parse both give an empty log.
    /// Reloading replaces whatever was held in memory.
    pub fn load(&mut self) -> &[CalculationRecord] {
        let records = match read_log(&self.path) {
            Ok(records) => records,
            Err(ReadFailure::Missing) => Vec::new(),
            Err(ReadFailure::Corrupt(reason)) => {
                warn!(path = %self.path.display(), %reason, "history file unreadable, starting empty");
                Vec::new()
            }
        };

        self.state = StoreState::Loaded(records);
        self.records()
    }

    /// Records in insertion order (empty before `load`)
    pub fn records(&self) -> &[CalculationRecord] {
        match &self.state {
            StoreState::Loaded(records) => records,
            StoreState::Uninitialized => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    /// Add a record and rewrite the whole file
    pub fn append(&mut self, record: CalculationRecord) -> Result<(), HistoryError> {
        let records = match &mut self.state {
            StoreState::Loaded(records) => records,
            StoreState::Uninitialized => return Err(HistoryError::NotLoaded),
        };

        if !record.is_finite() {
            return Err(HistoryError::NonFiniteAmount);
        }

        records.push(record);
        if let Err(e) = write_log(&self.path, records) {
            // memory never runs ahead of the file
            records.pop();
            return Err(e);
        }

        info!(path = %self.path.display(), total = records.len(), "history saved");
        Ok(())
    }

    /// Newest first, for display
    pub fn render_order(&self) -> Vec<&CalculationRecord> {
        self.records().iter().rev().collect()
    }
}

enum ReadFailure {
    Missing,
    Corrupt(String),
}

fn read_log(path: &Path) -> Result<Vec<CalculationRecord>, ReadFailure> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(ReadFailure::Missing),
        Err(e) => return Err(ReadFailure::Corrupt(e.to_string())),
    };

    serde_json::from_str(&content).map_err(|e| ReadFailure::Corrupt(e.to_string()))
}

fn write_log(path: &Path, records: &[CalculationRecord]) -> Result<(), HistoryError> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer)?;

    fs::write(path, buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::FeeInverter;
    use crate::fees::Modality;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn record(amount: f64, ts: NaiveDateTime) -> CalculationRecord {
        let result = FeeInverter::default()
            .compute(amount, Modality::DebitNow, None)
            .unwrap();
        CalculationRecord::from_result(&result, ts)
    }

    #[test]
    fn test_append_requires_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::new(dir.path().join("h.json"));

        let err = store.append(record(10.0, at(9, 0, 0))).unwrap_err();

        assert!(matches!(err, HistoryError::NotLoaded));
        assert!(!dir.path().join("h.json").exists());
    }

    #[test]
    fn test_non_finite_record_leaves_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let mut store = HistoryStore::new(&path);
        store.load();
        store.append(record(10.0, at(9, 0, 0))).unwrap();

        let mut bad = record(20.0, at(9, 1, 0));
        bad.gross = f64::INFINITY;
        bad.net_received = f64::INFINITY;
        let err = store.append(bad).unwrap_err();

        assert!(matches!(err, HistoryError::NonFiniteAmount));
        assert_eq!(store.len(), 1);
        assert_eq!(HistoryStore::new(&path).load().len(), 1);
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::new(dir.path().join("absent.json"));

        assert!(store.load().is_empty());
        assert!(store.is_loaded());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(&path, "{ not json").unwrap();

        let mut store = HistoryStore::new(&path);

        assert!(store.load().is_empty());
        // the next append replaces the broken file
        store.append(record(10.0, at(9, 0, 0))).unwrap();
        assert_eq!(HistoryStore::new(&path).load().len(), 1);
    }

    #[test]
    fn test_render_order_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = HistoryStore::new(dir.path().join("h.json"));
        store.load();

        store.append(record(10.0, at(9, 0, 0))).unwrap();
        store.append(record(20.0, at(9, 5, 0))).unwrap();
        store.append(record(30.0, at(9, 10, 0))).unwrap();

        let amounts: Vec<f64> = store.render_order().iter().map(|r| r.desired_net).collect();
        assert_eq!(amounts, vec![30.0, 20.0, 10.0]);
    }

    #[test]
    fn test_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        let mut store = HistoryStore::new(&path);
        store.load();

        store.append(record(100.0, at(14, 3, 22))).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"data\": \"2024-05-01 14:03:22\""));
        assert!(content.contains("\"modalidade\": \"Débito à vista\""));
        assert!(content.contains("\n        \"valor_desejado\": 100.0"));

        let data_pos = content.find("\"data\"").unwrap();
        let recebido_pos = content.find("\"valor_recebido\"").unwrap();
        assert!(data_pos < recebido_pos);
    }

    #[test]
    fn test_reads_files_from_previous_tool() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(
            &path,
            r#"[
    {
        "data": "2024-04-30 18:22:01",
        "valor_desejado": 120.0,
        "modalidade": "Crédito parcelado em 3x",
        "valor_cobrar": 128.0396069183214,
        "valor_recebido": 120.0
    }
]"#,
        )
        .unwrap();

        let mut store = HistoryStore::new(&path);
        let records = store.load();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].modality_label, "Crédito parcelado em 3x");
        assert_eq!(records[0].timestamp_string(), "2024-04-30 18:22:01");
    }

    #[test]
    fn test_bad_timestamp_counts_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        fs::write(
            &path,
            r#"[{"data": "yesterday", "valor_desejado": 1.0, "modalidade": "x", "valor_cobrar": 1.0, "valor_recebido": 1.0}]"#,
        )
        .unwrap();

        assert!(HistoryStore::new(&path).load().is_empty());
    }

    #[test]
    fn test_timestamp_truncated_to_seconds() {
        let ts = at(8, 0, 0).with_nanosecond(123_456_789).unwrap();
        let rec = record(1.0, ts);

        assert_eq!(rec.timestamp, at(8, 0, 0));
    }
}
