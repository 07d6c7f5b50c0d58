pub mod tables;

use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::info;

use crate::feedback::generate::FeedbackGenerator;
use crate::feedback::json::parse_lenient;
use crate::feedback::{compact_json, normalize, FeedbackRecord};
use crate::llm::TextGenerator;
use crate::prompts::{render_prompt, V1_PROMPT, V2_PROMPT};

use tables::{CleanRecord, MetaRecord, MetaTable, RawRow, RawTable, ReviewRow, WideRow};

/// Metadata columns the review table needs beyond the cache's own fields.
const META_COLUMNS: &[&str] = &["essay_set", "domain1_score", "essay_text"];

/// Everything the review table requires after the cache-path join.
const REQUIRED_COLUMNS: &[&str] = &[
    "essay_id",
    "essay_set",
    "domain1_score",
    "essay_text",
    "v1_json",
    "v2_json",
];

/// Generate both feedback variants for every essay, in input order.
///
/// The only stage that talks to the model; everything downstream can replay
/// from its cached output instead.
pub async fn run_llm_stage<G: TextGenerator>(
    docs: &[CleanRecord],
    generator: &FeedbackGenerator<G>,
) -> Vec<RawRow> {
    let total = docs.len();
    let mut rows = Vec::with_capacity(total);

    for (n, doc) in docs.iter().enumerate() {
        info!(essay_id = doc.essay_id, n = n + 1, total, "generating feedback");

        let v1 = generator
            .generate(&render_prompt(V1_PROMPT, &doc.essay_clean))
            .await;
        let v2 = generator
            .generate(&render_prompt(V2_PROMPT, &doc.essay_clean))
            .await;

        rows.push(RawRow {
            essay_id: doc.essay_id,
            v1_json: v1.to_compact_json(),
            v2_json: v2.to_compact_json(),
        });
    }

    rows
}

/// Parse one cached JSON cell into a feedback record. Empty or malformed
/// cells degrade to the empty record, never an error.
fn parse_feedback_cell(cell: &str) -> FeedbackRecord {
    match parse_lenient(cell) {
        Some(value) => normalize(&value),
        None => FeedbackRecord::empty(),
    }
}

/// Expand raw JSON cells into the six per-variant wide columns.
pub fn raw_to_wide(rows: &[RawRow]) -> Vec<WideRow> {
    rows.iter()
        .map(|row| {
            let v1 = parse_feedback_cell(&row.v1_json);
            let v2 = parse_feedback_cell(&row.v2_json);
            WideRow {
                essay_id: row.essay_id,
                v1_overall_summary: v1.overall_summary,
                v1_positives: compact_json(&v1.positives),
                v1_feedback_items: compact_json(&v1.feedback_items),
                v2_overall_summary: v2.overall_summary,
                v2_positives: compact_json(&v2.positives),
                v2_feedback_items: compact_json(&v2.feedback_items),
            }
        })
        .collect()
}

/// Inner-join the wide table against reference metadata on `essay_id`.
///
/// Essays missing from either side are dropped; output follows the wide
/// (input) order. Fails if the metadata table cannot supply the reference
/// columns at all; that is a setup error, not a data-quality one.
pub fn build_review_pack(meta: &MetaTable, wide: &[WideRow]) -> Result<Vec<ReviewRow>> {
    let missing: Vec<&str> = META_COLUMNS
        .iter()
        .filter(|c| !meta.columns.contains(**c))
        .copied()
        .collect();
    if !missing.is_empty() {
        bail!("Missing required metadata columns: {:?}", missing);
    }

    let by_id: HashMap<i64, &MetaRecord> =
        meta.records.iter().map(|m| (m.essay_id, m)).collect();

    let rows = wide
        .iter()
        .filter_map(|w| {
            let m = by_id.get(&w.essay_id)?;
            Some(ReviewRow {
                essay_id: w.essay_id,
                essay_set: m.essay_set.clone().unwrap_or_default(),
                domain1_score: m.domain1_score.clone().unwrap_or_default(),
                essay_text: m.essay_text.clone().unwrap_or_default(),
                v1_overall_summary: w.v1_overall_summary.clone(),
                v2_overall_summary: w.v2_overall_summary.clone(),
                v1_positives: w.v1_positives.clone(),
                v2_positives: w.v2_positives.clone(),
                v1_feedback_items: w.v1_feedback_items.clone(),
                v2_feedback_items: w.v2_feedback_items.clone(),
            })
        })
        .collect();

    Ok(rows)
}

/// Rebuild the review table from a cached raw table without model calls.
///
/// Metadata columns already present on the cache win; only the missing ones
/// are left-joined in from the sample table, which keeps column names free
/// of duplicate-join collisions. Fails if any required column is still
/// absent after the join.
pub fn build_review_from_raw(raw: &RawTable, meta: &MetaTable) -> Result<Vec<ReviewRow>> {
    // Column-level join plan: which logical columns can the output draw on?
    let mut available = raw.columns.clone();
    for col in META_COLUMNS {
        if !available.contains(*col) && meta.columns.contains(*col) {
            available.insert((*col).to_string());
        }
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !available.contains(**c))
        .copied()
        .collect();
    if !missing.is_empty() {
        bail!("Missing required columns after join: {:?}", missing);
    }

    let meta_by_id: HashMap<i64, &MetaRecord> =
        meta.records.iter().map(|m| (m.essay_id, m)).collect();

    let pick = |cached: &Option<String>, col: &str, fallback: Option<&MetaRecord>| -> String {
        if raw.columns.contains(col) {
            cached.clone().unwrap_or_default()
        } else {
            fallback
                .and_then(|m| match col {
                    "essay_set" => m.essay_set.clone(),
                    "domain1_score" => m.domain1_score.clone(),
                    "essay_text" => m.essay_text.clone(),
                    _ => None,
                })
                .unwrap_or_default()
        }
    };

    let rows = raw
        .records
        .iter()
        .map(|r| {
            let m = meta_by_id.get(&r.essay_id).copied();
            let v1 = parse_feedback_cell(&r.v1_json);
            let v2 = parse_feedback_cell(&r.v2_json);
            ReviewRow {
                essay_id: r.essay_id,
                essay_set: pick(&r.essay_set, "essay_set", m),
                domain1_score: pick(&r.domain1_score, "domain1_score", m),
                essay_text: pick(&r.essay_text, "essay_text", m),
                v1_overall_summary: v1.overall_summary,
                v2_overall_summary: v2.overall_summary,
                v1_positives: compact_json(&v1.positives),
                v2_positives: compact_json(&v2.positives),
                v1_feedback_items: compact_json(&v1.feedback_items),
                v2_feedback_items: compact_json(&v2.feedback_items),
            }
        })
        .collect();

    Ok(rows)
}
