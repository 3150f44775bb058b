use super::exit_codes;
use crate::cli::args::{ReportArgs, YesNo};
use juliet_core::storage::Store;
use juliet_metrics::{StatReport, StatisticsEngine};

pub fn cmd_report(args: ReportArgs) -> anyhow::Result<i32> {
    let store = Store::open_existing(&args.database)?.with_query_echo(args.debug == YesNo::Yes);
    let engine = StatisticsEngine::new(&store);

    let summaries = engine.summarize_category(&args.category, args.tool.map(Into::into))?;
    tracing::debug!(event = "report_ready", summaries = summaries.len());

    let report = StatReport::new(
        &args.database.display().to_string(),
        &args.category.to_string(),
        summaries,
    );
    if args.format == "json" {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(exit_codes::OK)
}
