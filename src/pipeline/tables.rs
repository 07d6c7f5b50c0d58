use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// One cleaned essay from the input table.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanRecord {
    pub essay_id: i64,
    pub essay_clean: String,
}

/// One row of the reference metadata table.
///
/// Value columns stay verbatim strings; the pipeline never interprets the
/// score. `essay` and `set` header variants map onto the canonical names.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaRecord {
    pub essay_id: i64,
    #[serde(default, alias = "essay")]
    pub essay_text: Option<String>,
    #[serde(default, alias = "set")]
    pub essay_set: Option<String>,
    #[serde(default)]
    pub domain1_score: Option<String>,
}

/// One row of a cached raw table: per-variant feedback JSON plus whatever
/// metadata columns the cache already carries.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub essay_id: i64,
    #[serde(default)]
    pub v1_json: String,
    #[serde(default)]
    pub v2_json: String,
    #[serde(default, alias = "essay")]
    pub essay_text: Option<String>,
    #[serde(default, alias = "set")]
    pub essay_set: Option<String>,
    #[serde(default)]
    pub domain1_score: Option<String>,
}

/// One row of the freshly generated raw table (what the LLM stage writes).
#[derive(Debug, Clone, Serialize)]
pub struct RawRow {
    pub essay_id: i64,
    pub v1_json: String,
    pub v2_json: String,
}

/// One row of the wide table: essay id plus the six expanded feedback
/// fields, the list-valued ones as compact JSON text.
#[derive(Debug, Clone, Serialize)]
pub struct WideRow {
    pub essay_id: i64,
    pub v1_overall_summary: String,
    pub v1_positives: String,
    pub v1_feedback_items: String,
    pub v2_overall_summary: String,
    pub v2_positives: String,
    pub v2_feedback_items: String,
}

/// One row of the final review table. Field order is the fixed output
/// column order.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRow {
    pub essay_id: i64,
    pub essay_set: String,
    pub domain1_score: String,
    pub essay_text: String,
    pub v1_overall_summary: String,
    pub v2_overall_summary: String,
    pub v1_positives: String,
    pub v2_positives: String,
    pub v1_feedback_items: String,
    pub v2_feedback_items: String,
}

/// A loaded metadata table plus the set of canonical column names its
/// header carried. The header set drives join validation.
#[derive(Debug)]
pub struct MetaTable {
    pub columns: HashSet<String>,
    pub records: Vec<MetaRecord>,
}

/// A loaded raw cache table plus its canonical header set.
#[derive(Debug)]
pub struct RawTable {
    pub columns: HashSet<String>,
    pub records: Vec<RawRecord>,
}

/// Map header-name variants onto the canonical column names.
fn canonical_column(name: &str) -> String {
    match name {
        "essay" => "essay_text".to_string(),
        "set" => "essay_set".to_string(),
        other => other.to_string(),
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn header_columns(reader: &mut csv::Reader<std::fs::File>, path: &Path) -> Result<HashSet<String>> {
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?;
    Ok(headers.iter().map(canonical_column).collect())
}

pub fn load_clean_csv(path: &Path) -> Result<Vec<CleanRecord>> {
    let mut reader = open_reader(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(records)
}

pub fn load_meta_csv(path: &Path) -> Result<MetaTable> {
    let mut reader = open_reader(path)?;
    let columns = header_columns(&mut reader, path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(MetaTable { columns, records })
}

pub fn load_raw_csv(path: &Path) -> Result<RawTable> {
    let mut reader = open_reader(path)?;
    let columns = header_columns(&mut reader, path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(RawTable { columns, records })
}

/// Write rows to a CSV file, headers from the row type's field names.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_meta_honors_header_variants() {
        let file = write_temp_csv("essay_id,essay,set,domain1_score\n1,Once upon a time,3,4\n");
        let table = load_meta_csv(file.path()).unwrap();

        assert!(table.columns.contains("essay_text"));
        assert!(table.columns.contains("essay_set"));
        assert!(table.columns.contains("domain1_score"));

        let m = &table.records[0];
        assert_eq!(m.essay_id, 1);
        assert_eq!(m.essay_text.as_deref(), Some("Once upon a time"));
        assert_eq!(m.essay_set.as_deref(), Some("3"));
        assert_eq!(m.domain1_score.as_deref(), Some("4"));
    }

    #[test]
    fn test_load_meta_tolerates_missing_columns() {
        let file = write_temp_csv("essay_id,essay_text\n7,hello\n");
        let table = load_meta_csv(file.path()).unwrap();

        assert!(!table.columns.contains("domain1_score"));
        assert_eq!(table.records[0].domain1_score, None);
        assert_eq!(table.records[0].essay_set, None);
    }

    #[test]
    fn test_load_raw_with_cached_meta_columns() {
        let file = write_temp_csv(
            "essay_id,v1_json,v2_json,essay_set\n1,{\"overall_summary\":\"a\"},{},5\n",
        );
        let table = load_raw_csv(file.path()).unwrap();

        assert!(table.columns.contains("essay_set"));
        assert!(!table.columns.contains("essay_text"));
        let r = &table.records[0];
        assert_eq!(r.v1_json, "{\"overall_summary\":\"a\"}");
        assert_eq!(r.essay_set.as_deref(), Some("5"));
    }

    #[test]
    fn test_review_header_order_is_fixed() {
        let row = ReviewRow {
            essay_id: 1,
            essay_set: "3".to_string(),
            domain1_score: "4".to_string(),
            essay_text: "text".to_string(),
            v1_overall_summary: String::new(),
            v2_overall_summary: String::new(),
            v1_positives: "[]".to_string(),
            v2_positives: "[]".to_string(),
            v1_feedback_items: "[]".to_string(),
            v2_feedback_items: "[]".to_string(),
        };
        let file = tempfile::NamedTempFile::new().unwrap();
        write_csv(file.path(), &[row]).unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        let header = written.lines().next().unwrap();
        assert_eq!(
            header,
            "essay_id,essay_set,domain1_score,essay_text,\
             v1_overall_summary,v2_overall_summary,\
             v1_positives,v2_positives,\
             v1_feedback_items,v2_feedback_items"
        );
    }
}
