mod config;
mod feedback;
mod llm;
mod pipeline;
mod prompts;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, Level};

use config::LlmConfig;
use feedback::generate::{FeedbackGenerator, GenerationSettings};
use llm::LlmBackend;
use pipeline::tables::{self, RawRow};

/// Turn model feedback on student essays into flat review tables.
#[derive(Debug, Parser)]
#[command(name = "evalpack", version, about)]
struct Cli {
    /// Cleaned-essay input table (essay_id, essay_clean)
    #[arg(long, default_value = "data/sample_50_with_clean.csv")]
    clean_csv: PathBuf,

    /// Reference metadata table (essay_id, essay_set, domain1_score, essay_text)
    #[arg(long, default_value = "data/sample_50_set1.csv")]
    meta_csv: PathBuf,

    /// Output directory
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Skip the model entirely and reconcile from a cached raw table
    #[arg(long)]
    skip_llm: bool,

    /// Cached raw table used with --skip-llm
    #[arg(long, default_value = "data/eval_pack_raw.csv")]
    raw_csv: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load env
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    fs::create_dir_all(&cli.out_dir)?;

    let out_raw = cli.out_dir.join("eval_pack_raw.csv");
    let out_wide = cli.out_dir.join("eval_pack_wide.csv");
    let out_review = cli.out_dir.join("eval_pack_review.csv");

    let meta = tables::load_meta_csv(&cli.meta_csv)?;
    info!(rows = meta.records.len(), "metadata table loaded");

    let review = if cli.skip_llm {
        let raw = tables::load_raw_csv(&cli.raw_csv)?;
        info!(rows = raw.records.len(), "reusing cached raw feedback");

        let raw_rows: Vec<RawRow> = raw
            .records
            .iter()
            .map(|r| RawRow {
                essay_id: r.essay_id,
                v1_json: r.v1_json.clone(),
                v2_json: r.v2_json.clone(),
            })
            .collect();
        let wide = pipeline::raw_to_wide(&raw_rows);
        tables::write_csv(&out_wide, &wide)?;

        pipeline::build_review_from_raw(&raw, &meta)?
    } else {
        // Credential check happens here, so the cache-only path above never
        // needs a key.
        let llm_config = LlmConfig::from_env()?;
        info!(
            model = %llm_config.model,
            backend = ?llm_config.backend,
            "LLM client initialized"
        );
        let backend = LlmBackend::from_config(&llm_config)?;
        let generator = FeedbackGenerator::new(backend, GenerationSettings::default());

        let docs = tables::load_clean_csv(&cli.clean_csv)?;
        info!(count = docs.len(), "cleaned essays loaded");

        let raw_rows = pipeline::run_llm_stage(&docs, &generator).await;
        tables::write_csv(&out_raw, &raw_rows)?;

        let wide = pipeline::raw_to_wide(&raw_rows);
        tables::write_csv(&out_wide, &wide)?;

        pipeline::build_review_pack(&meta, &wide)?
    };

    tables::write_csv(&out_review, &review)?;

    println!("Wrote:");
    if cli.skip_llm {
        println!("(skipped llm, used {})", cli.raw_csv.display());
    } else {
        println!("{}", out_raw.display());
    }
    println!("{}", out_wide.display());
    println!("{}", out_review.display());
    println!("Rows: {}", review.len());

    Ok(())
}
