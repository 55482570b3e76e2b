use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::DEFAULT_TOPIC;
use crate::error::{MentorError, Result};
use crate::model::QaRecord;

/// An uncleaned ingestion row; every field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub topic: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    List(Vec<RawRecord>),
    Wrapped { items: Vec<RawRecord> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Csv,
}

impl RecordFormat {
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("csv") => Ok(Self::Csv),
            _ => Err(MentorError::validation(format!(
                "unsupported file '{name}' (expected .csv or .json)"
            ))),
        }
    }
}

/// Drops rows without a question or answer, defaults blank topics, and
/// fails when nothing usable remains.
pub fn clean_records(raw: impl IntoIterator<Item = RawRecord>) -> Result<Vec<QaRecord>> {
    fn non_blank(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    let mut dropped = 0usize;
    let records: Vec<QaRecord> = raw
        .into_iter()
        .filter_map(|r| {
            let (Some(question), Some(answer)) = (non_blank(r.question), non_blank(r.answer))
            else {
                dropped += 1;
                return None;
            };
            let topic = non_blank(r.topic).unwrap_or_else(|| DEFAULT_TOPIC.to_string());
            Some(QaRecord {
                question,
                answer,
                topic,
            })
        })
        .collect();

    if dropped > 0 {
        tracing::warn!(dropped, kept = records.len(), "dropped rows without question or answer");
    }
    if records.is_empty() {
        return Err(MentorError::validation(
            "no valid question/answer rows after cleaning",
        ));
    }
    Ok(records)
}

pub fn parse_json(bytes: &[u8]) -> Result<Vec<QaRecord>> {
    let payload: JsonPayload = serde_json::from_slice(bytes)
        .map_err(|e| MentorError::validation(format!("invalid JSON records: {e}")))?;
    match payload {
        JsonPayload::List(items) | JsonPayload::Wrapped { items } => clean_records(items),
    }
}

pub fn parse_csv(bytes: &[u8]) -> Result<Vec<QaRecord>> {
    let invalid = |e: csv::Error| MentorError::validation(format!("invalid CSV records: {e}"));

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);
    let headers = reader.headers().map_err(invalid)?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (Some(q_col), Some(a_col)) = (column("question"), column("answer")) else {
        return Err(MentorError::validation(
            "CSV must have 'question' and 'answer' columns",
        ));
    };
    let t_col = column("topic");

    let mut raw = Vec::new();
    for row in reader.records() {
        let row = row.map_err(invalid)?;
        let field = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(str::to_string);
        raw.push(RawRecord {
            question: field(Some(q_col)),
            answer: field(Some(a_col)),
            topic: field(t_col),
        });
    }
    clean_records(raw)
}

pub fn parse_records(bytes: &[u8], format: RecordFormat) -> Result<Vec<QaRecord>> {
    match format {
        RecordFormat::Json => parse_json(bytes),
        RecordFormat::Csv => parse_csv(bytes),
    }
}

pub fn load_records_file(path: &Path) -> Result<Vec<QaRecord>> {
    let format = RecordFormat::from_file_name(&path.to_string_lossy())?;
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(MentorError::NotFound(path.to_path_buf()))
        }
        Err(err) => return Err(err.into()),
    };
    parse_records(&bytes, format)
}
