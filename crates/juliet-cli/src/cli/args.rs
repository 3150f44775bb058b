use clap::{Parser, Subcommand, ValueEnum};
use juliet_core::model::{TestSuite, Tool};
use juliet_metrics::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "juliet",
    version,
    about = "Benchmark memory-error detectors against the Juliet test suite"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute the corpus under the selected tools and record every outcome
    Run(RunArgs),
    /// Print per-tool, per-class diagnostic statistics from a results database
    Report(ReportArgs),
    Version,
}

#[derive(Parser, Clone, Debug)]
pub struct RunArgs {
    /// Taint-engine emulator binary (qte-qemu)
    pub qte_binary: PathBuf,

    /// Taint-engine intercept library (libqte.so)
    pub qte_library: PathBuf,

    /// Sanitizer emulator binary
    pub qasan_binary: PathBuf,

    /// Sanitizer emulator runtime library
    pub qasan_library: PathBuf,

    /// Which tool(s) to run against the corpus
    #[arg(long, value_enum, default_value_t = SuiteArg::All)]
    pub testsuite: SuiteArg,

    /// Root of the compiled corpus
    #[arg(long, default_value = ".")]
    pub corpus: PathBuf,

    #[arg(long, default_value = juliet_core::config::DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Per test case wall-clock limit in seconds (default 5, env JULIET_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Worker count (default: logical cores - 1, env JULIET_PARALLEL)
    #[arg(long)]
    pub jobs: Option<usize>,
}

#[derive(Parser, Clone, Debug)]
pub struct ReportArgs {
    /// CWE category (e.g. CWE121 or CWE121_Stack_Based_Buffer_Overflow) or 'all'
    pub category: Category,

    #[arg(long, default_value = juliet_core::config::DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// Echo every query before running it
    #[arg(long, value_enum, default_value_t = YesNo::No)]
    pub debug: YesNo,

    /// Restrict the report to one tool
    #[arg(long, value_enum)]
    pub tool: Option<ToolArg>,

    /// Output format: text | json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuiteArg {
    All,
    Qte,
    Qasan,
    Asan,
}

impl From<SuiteArg> for TestSuite {
    fn from(s: SuiteArg) -> Self {
        match s {
            SuiteArg::All => TestSuite::All,
            SuiteArg::Qte => TestSuite::Only(Tool::Qte),
            SuiteArg::Qasan => TestSuite::Only(Tool::Qasan),
            SuiteArg::Asan => TestSuite::Only(Tool::Asan),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolArg {
    Qte,
    Qasan,
    Asan,
}

impl From<ToolArg> for Tool {
    fn from(t: ToolArg) -> Self {
        match t {
            ToolArg::Qte => Tool::Qte,
            ToolArg::Qasan => Tool::Qasan,
            ToolArg::Asan => Tool::Asan,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}
