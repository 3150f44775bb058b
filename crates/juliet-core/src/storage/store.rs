use crate::errors::HarnessError;
use crate::model::{Classification, ExecutionOutcome, GroundTruth, Tool};
use anyhow::Context;
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Result of an insert-if-absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    Inserted,
    /// A row with the same id already exists; nothing was written.
    Duplicate,
}

/// Single-table result store. One connection serialises all writes.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    echo_queries: bool,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and ensures the schema.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        let store = Self::from_conn(conn);
        store.init_schema()?;
        Ok(store)
    }

    /// Opens a database that must already exist (the reporting pass).
    pub fn open_existing(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(HarnessError::MissingDatabase {
                path: path.to_path_buf(),
            }
            .into());
        }
        Self::open(path)
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        let store = Self::from_conn(conn);
        store.init_schema()?;
        Ok(store)
    }

    fn from_conn(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            echo_queries: false,
        }
    }

    /// Print every read query with its parameters to stderr before running it.
    pub fn with_query_echo(mut self, on: bool) -> Self {
        self.echo_queries = on;
        self
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock();
        conn.execute_batch(crate::storage::schema::DDL)
            .context("failed to initialise EXPERIMENT schema")?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts the outcome unless a row with its id exists. Existing rows are
    /// never overwritten.
    pub fn insert_if_absent(&self, o: &ExecutionOutcome) -> anyhow::Result<InsertStatus> {
        let conn = self.lock();
        let changed = conn
            .execute(
                "INSERT INTO EXPERIMENT (id, filename, tool, truth, class, ret_code, ret_output, ret_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO NOTHING",
                params![
                    o.test_case_id,
                    o.file_path,
                    o.tool.as_str(),
                    o.ground_truth.as_str(),
                    o.bug_class,
                    o.return_code,
                    o.raw_output,
                    o.classification.as_str(),
                ],
            )
            .context("insert outcome")?;
        Ok(if changed == 0 {
            InsertStatus::Duplicate
        } else {
            InsertStatus::Inserted
        })
    }

    pub fn get(&self, id: &str) -> anyhow::Result<Option<ExecutionOutcome>> {
        let conn = self.lock();
        let raw = conn
            .query_row(
                "SELECT id, filename, tool, truth, class, ret_code, ret_output, ret_status
                 FROM EXPERIMENT WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        output_bytes(row.get_ref(6)?),
                        row.get::<_, String>(7)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, file_path, tool, truth, bug_class, code, raw_output, status)) = raw else {
            return Ok(None);
        };
        let tool: Tool = tool.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let ground_truth = GroundTruth::parse(&truth)
            .ok_or_else(|| anyhow::anyhow!("row {} has invalid truth '{}'", id, truth))?;
        let classification = Classification::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("row {} has invalid ret_status '{}'", id, status))?;

        Ok(Some(ExecutionOutcome {
            test_case_id: id,
            file_path,
            tool,
            ground_truth,
            bug_class,
            return_code: code as i32,
            raw_output,
            classification,
        }))
    }

    pub fn row_count(&self) -> anyhow::Result<u64> {
        self.count("SELECT COUNT(*) FROM EXPERIMENT", &[])
    }

    /// Ground-truth rows of a (tool, class) pair that belong to the scored
    /// population (timed-out and harness-error rows excluded).
    pub fn count_population(
        &self,
        tool: &str,
        class: &str,
        truth: GroundTruth,
    ) -> anyhow::Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM EXPERIMENT
             WHERE tool = ?1 AND class = ?2 AND truth = ?3
               AND ret_status NOT IN ('timedout', 'error')",
            &[tool, class, truth.as_str()],
        )
    }

    /// One confusion-matrix cell.
    pub fn count_verdicts(
        &self,
        tool: &str,
        class: &str,
        truth: GroundTruth,
        classification: Classification,
    ) -> anyhow::Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM EXPERIMENT
             WHERE tool = ?1 AND class = ?2 AND truth = ?3 AND ret_status = ?4",
            &[tool, class, truth.as_str(), classification.as_str()],
        )
    }

    pub fn count_status(
        &self,
        tool: &str,
        class: &str,
        classification: Classification,
    ) -> anyhow::Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM EXPERIMENT
             WHERE tool = ?1 AND class = ?2 AND ret_status = ?3",
            &[tool, class, classification.as_str()],
        )
    }

    /// Distinct (tool, class) pairs present in the table, sorted.
    pub fn pairs(&self) -> anyhow::Result<Vec<(String, String)>> {
        let sql = "SELECT DISTINCT tool, class FROM EXPERIMENT ORDER BY tool, class";
        self.echo(sql, &[]);
        let conn = self.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, sql: &str, args: &[&str]) -> anyhow::Result<u64> {
        self.echo(sql, args);
        let conn = self.lock();
        let n: i64 = conn.query_row(sql, params_from_iter(args.iter()), |r| r.get(0))?;
        Ok(n as u64)
    }

    fn echo(&self, sql: &str, args: &[&str]) {
        if self.echo_queries {
            let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
            eprintln!("Executing query : {} {:?}", flat, args);
        }
    }
}

fn output_bytes(v: ValueRef<'_>) -> Vec<u8> {
    match v {
        ValueRef::Blob(b) | ValueRef::Text(b) => b.to_vec(),
        ValueRef::Null => Vec::new(),
        ValueRef::Integer(i) => i.to_string().into_bytes(),
        ValueRef::Real(f) => f.to_string().into_bytes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessExit, TestCase};
    use std::path::PathBuf;

    fn case(name: &str, tool: Tool, truth: GroundTruth) -> TestCase {
        TestCase::new(
            PathBuf::from(format!("/c/{}_tests/CWE121_S/{}/{}", tool, truth, name)),
            tool,
            truth,
            "CWE121_S".into(),
        )
    }

    #[test]
    fn duplicate_insert_keeps_first_row() -> anyhow::Result<()> {
        let store = Store::memory()?;
        let tc = case("CWE121_S__a_01.out", Tool::Qte, GroundTruth::Bad);

        let first = ExecutionOutcome::from_exit(&tc, ProcessExit::Completed(1), b"boom".to_vec());
        let second = ExecutionOutcome::from_exit(&tc, ProcessExit::Completed(0), Vec::new());

        assert_eq!(store.insert_if_absent(&first)?, InsertStatus::Inserted);
        assert_eq!(store.insert_if_absent(&second)?, InsertStatus::Duplicate);
        assert_eq!(store.row_count()?, 1);

        let stored = store.get(&tc.id)?.expect("row exists");
        assert_eq!(stored, first);
        Ok(())
    }

    #[test]
    fn binary_output_survives() -> anyhow::Result<()> {
        let store = Store::memory()?;
        let tc = case("CWE121_S__b_01.out", Tool::Asan, GroundTruth::Good);
        let bytes = vec![0xff, 0x00, 0xfe, b'\n'];
        store.insert_if_absent(&ExecutionOutcome::from_exit(
            &tc,
            ProcessExit::Completed(0),
            bytes.clone(),
        ))?;
        assert_eq!(store.get(&tc.id)?.unwrap().raw_output, bytes);
        Ok(())
    }

    #[test]
    fn text_output_from_older_rows_is_readable() -> anyhow::Result<()> {
        let store = Store::memory()?;
        {
            let conn = store.lock();
            conn.execute(
                "INSERT INTO EXPERIMENT VALUES ('h1', '/f.out', 'qte', 'bad', 'CWE121_S', 1, 'text out', 'bad')",
                [],
            )?;
        }
        let row = store.get("h1")?.unwrap();
        assert_eq!(row.raw_output, b"text out".to_vec());
        assert_eq!(row.classification, Classification::Bad);
        Ok(())
    }

    #[test]
    fn unknown_status_is_rejected_not_reclassified() -> anyhow::Result<()> {
        let store = Store::memory()?;
        {
            let conn = store.lock();
            conn.execute(
                "INSERT INTO EXPERIMENT VALUES ('h2', '/f.out', 'qte', 'bad', 'CWE121_S', 1, '', 'crashed')",
                [],
            )?;
        }
        let err = store.get("h2").unwrap_err();
        assert!(err.to_string().contains("crashed"));
        Ok(())
    }

    #[test]
    fn population_excludes_timeouts_and_errors() -> anyhow::Result<()> {
        let store = Store::memory()?;
        let a = case("CWE121_S__a_01.out", Tool::Qte, GroundTruth::Good);
        let b = case("CWE121_S__b_01.out", Tool::Qte, GroundTruth::Good);
        let c = case("CWE121_S__c_01.out", Tool::Qte, GroundTruth::Good);
        store.insert_if_absent(&ExecutionOutcome::from_exit(&a, ProcessExit::Completed(0), vec![]))?;
        store.insert_if_absent(&ExecutionOutcome::from_exit(&b, ProcessExit::TimedOut, vec![]))?;
        store.insert_if_absent(&ExecutionOutcome::harness_error(&c, "spawn failed"))?;

        assert_eq!(store.count_population("qte", "CWE121_S", GroundTruth::Good)?, 1);
        assert_eq!(store.count_status("qte", "CWE121_S", Classification::TimedOut)?, 1);
        assert_eq!(store.count_status("qte", "CWE121_S", Classification::Error)?, 1);
        assert_eq!(
            store.pairs()?,
            vec![("qte".to_string(), "CWE121_S".to_string())]
        );
        Ok(())
    }
}
