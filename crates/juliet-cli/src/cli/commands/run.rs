use super::exit_codes;
use crate::cli::args::RunArgs;
use juliet_core::config::{EmulatorArtifacts, HarnessConfig};
use juliet_core::corpus::CorpusScanner;
use juliet_core::engine::{ExecutionPool, Runner};
use juliet_core::errors::HarnessError;
use juliet_core::model::TestCase;
use juliet_core::report::print_summary;
use juliet_core::storage::Store;
use std::path::Path;
use std::time::Duration;

pub fn build_config(args: &RunArgs) -> Result<HarnessConfig, HarnessError> {
    let mut cfg = HarnessConfig::new(
        EmulatorArtifacts::new(&args.qte_binary, &args.qte_library),
        EmulatorArtifacts::new(&args.qasan_binary, &args.qasan_library),
    )
    .with_env_overrides();

    cfg.corpus_root = args.corpus.clone();
    cfg.db_path = args.database.clone();
    cfg.suite = args.testsuite.into();
    if let Some(secs) = args.timeout {
        cfg.timeout = Duration::from_secs(secs);
    }
    if let Some(jobs) = args.jobs {
        cfg.parallelism = jobs;
    }
    cfg.validate()?;
    Ok(cfg)
}

pub async fn cmd_run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = build_config(&args)?;

    // Artifacts are checked before the database is touched or anything runs.
    let pool = ExecutionPool::from_config(&cfg)?;

    if cfg.db_exists() {
        tracing::info!(event = "database_reused", path = %cfg.db_path.display(), "Database already exists, continuing..");
    } else {
        tracing::info!(event = "database_created", path = %cfg.db_path.display(), "Setting up the database.");
    }
    let store = Store::open(&cfg.db_path)?;

    let scanner = CorpusScanner::new(&cfg.corpus_root)?;
    let cases = scanner.collect()?;
    warn_partial_corpus(&cfg, scanner.root(), &cases);

    let summary = Runner::new(store, pool).run_cases(cases).await?;
    print_summary(&summary);
    Ok(exit_codes::OK)
}

fn warn_partial_corpus(cfg: &HarnessConfig, root: &Path, cases: &[TestCase]) {
    for tool in cfg.suite.tools() {
        if !cases.iter().any(|tc| tc.tool == tool) {
            tracing::warn!(
                event = "partial_corpus",
                tool = %tool,
                root = %root.display(),
                "no test cases found for selected tool"
            );
        }
    }
}
