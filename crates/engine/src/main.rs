//! Charbuild Engine - evaluates a character file against a content bundle.
//!
//! Usage: `charbuild-engine <character.json>`
//!
//! The content bundle is read from `CHARBUILD_CONTENT_PATH` (default
//! `content.json`). The character file holds `{scope?, baseline, operations,
//! choices}`; the evaluation summary is printed to stdout as JSON.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use charbuild_domain::{CharacterId, Variable};
use charbuild_engine::infrastructure::{
    clock::SystemClock, content_cache::ContentCache, memory_content::InMemoryContentRepo,
    ports::ClockPort, settings::EngineSettings,
};
use charbuild_engine::stores::{BonusLedger, VariableStore};
use charbuild_engine::use_cases::evaluation::{
    ContentGrant, Diagnostic, EvaluationReport, EvaluationRequest, Evaluator, PendingSelection,
    SpellSlotRecord,
};

#[derive(Serialize)]
struct Summary<'a> {
    scope: CharacterId,
    passes: u32,
    variables: &'a [Variable],
    bonus_totals: BTreeMap<&'a str, i32>,
    grants: &'a [ContentGrant],
    spell_slots: &'a [SpellSlotRecord],
    pending_selections: &'a [PendingSelection],
    diagnostics: &'a [Diagnostic],
}

impl<'a> From<&'a EvaluationReport> for Summary<'a> {
    fn from(report: &'a EvaluationReport) -> Self {
        Self {
            scope: report.scope,
            passes: report.passes,
            variables: &report.variables,
            bonus_totals: report
                .bonuses
                .iter()
                .map(|(name, breakdown)| (name.as_str(), breakdown.total()))
                .collect(),
            grants: &report.grants,
            spell_slots: &report.spell_slots,
            pending_selections: &report.pending_selections,
            diagnostics: &report.diagnostics,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charbuild_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let character_path = std::env::args()
        .nth(1)
        .context("usage: charbuild-engine <character.json>")?;
    let content_path =
        std::env::var("CHARBUILD_CONTENT_PATH").unwrap_or_else(|_| "content.json".into());

    let settings = EngineSettings::from_env();
    tracing::info!(
        vivify_policy = %settings.vivify_policy,
        settle_max_passes = settings.settle_max_passes,
        sources = settings.enabled_content_sources.len(),
        "Starting Charbuild Engine"
    );

    let repo = Arc::new(InMemoryContentRepo::from_path(&content_path)?);
    let content = Arc::new(ContentCache::new(repo, settings.max_entities_per_source));
    content
        .define_enabled_sources(settings.enabled_content_sources.iter().copied())
        .await;

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let evaluator = Evaluator::new(
        Arc::new(VariableStore::new(settings.vivify_policy)),
        Arc::new(BonusLedger::new()),
        content,
        clock,
        &settings,
    );

    let raw = std::fs::read_to_string(&character_path)
        .with_context(|| format!("reading {}", character_path))?;
    let request: EvaluationRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", character_path))?;

    let report = evaluator.evaluate(&request).await?;
    println!("{}", serde_json::to_string_pretty(&Summary::from(&report))?);
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
