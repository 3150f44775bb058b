pub mod category;
pub mod confusion;
pub mod diagnostics;
pub mod engine;
pub mod report;

pub use category::Category;
pub use confusion::ConfusionMatrix;
pub use diagnostics::DiagnosticRatios;
pub use engine::{StatSummary, StatisticsEngine};
pub use report::StatReport;
