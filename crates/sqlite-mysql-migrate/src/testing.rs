//! In-memory target writer for engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::traits::TargetWriter;
use crate::core::value::Row;
use crate::error::{MigrateError, Result};

/// Everything the writer was asked to do, shared with the test body.
#[derive(Debug, Default)]
pub(crate) struct WriterLog {
    /// Executed statements in order (`DROP t`, `CREATE ...`, `FK 0`, ...).
    pub statements: Vec<String>,
    /// Committed rows per table.
    pub rows: HashMap<String, Vec<Row>>,
    /// Number of `insert_ignore_batch` calls, failed ones included.
    pub insert_calls: usize,
    pub rollbacks: usize,
    pub closed: bool,
}

/// Recording `TargetWriter` with failure injection.
///
/// Rows whose first value was already committed for the same table are
/// ignored, the way a primary key makes `INSERT IGNORE` skip them.
#[derive(Default)]
pub(crate) struct RecordingWriter {
    pub log: Arc<Mutex<WriterLog>>,
    /// 1-based insert calls (across the run) that fail.
    pub fail_inserts: HashSet<usize>,
    /// Tables whose CREATE fails.
    pub fail_create: HashSet<String>,
    pub fail_fk_toggle: bool,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<Mutex<WriterLog>> {
        Arc::clone(&self.log)
    }

    fn record(&self, statement: String) {
        self.log.lock().unwrap().statements.push(statement);
    }
}

#[async_trait]
impl TargetWriter for RecordingWriter {
    async fn set_foreign_key_checks(&mut self, enabled: bool) -> Result<()> {
        if self.fail_fk_toggle {
            return Err(MigrateError::IntegrityToggle("access denied".into()));
        }
        self.record(format!("FK {}", u8::from(enabled)));
        Ok(())
    }

    async fn drop_table(&mut self, table: &str) -> Result<()> {
        self.record(format!("DROP {}", table));
        self.log.lock().unwrap().rows.remove(table);
        Ok(())
    }

    async fn create_table(&mut self, ddl: &str) -> Result<()> {
        if self
            .fail_create
            .iter()
            .any(|t| ddl.starts_with(&format!("CREATE TABLE IF NOT EXISTS `{}`", t)))
        {
            return Err(MigrateError::Config("You have an error in your SQL syntax".into()));
        }
        self.record(ddl.to_string());
        Ok(())
    }

    async fn insert_ignore_batch(
        &mut self,
        table: &str,
        _columns: &[String],
        rows: &[Row],
    ) -> Result<u64> {
        let mut log = self.log.lock().unwrap();
        log.insert_calls += 1;
        if self.fail_inserts.contains(&log.insert_calls) {
            log.rollbacks += 1;
            return Err(MigrateError::Config("Deadlock found when trying to get lock".into()));
        }

        let committed = log.rows.entry(table.to_string()).or_default();
        let mut inserted = 0;
        for row in rows {
            let duplicate = row
                .first()
                .is_some_and(|key| committed.iter().any(|r| r.first() == Some(key)));
            if !duplicate {
                committed.push(row.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn rollback(&mut self) -> Result<()> {
        self.log.lock().unwrap().rollbacks += 1;
        Ok(())
    }

    async fn ping(&mut self) -> Result<()> {
        Ok(())
    }

    async fn close(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.closed = true;
        log.statements.push("CLOSE".to_string());
    }
}
