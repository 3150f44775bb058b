/// `EXPERIMENT` is the durable contract shared with earlier collection
/// tooling: column names and the primary key on `id` must not change.
pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS EXPERIMENT (
  id TEXT PRIMARY KEY,
  filename TEXT,
  tool TEXT,
  truth TEXT,
  class TEXT,
  ret_code INTEGER,
  ret_output TEXT,
  ret_status TEXT
);

CREATE INDEX IF NOT EXISTS idx_experiment_tool_class ON EXPERIMENT(tool, class);
"#;
