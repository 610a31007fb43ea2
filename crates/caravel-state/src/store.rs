//! StateStore — redb-backed persistence for the control plane.
//!
//! Provides typed CRUD operations over pipeline runs, clusters,
//! applications, template releases, and regions. All values are
//! JSON-serialized into redb's `&[u8]` value columns. The store
//! supports both on-disk and in-memory backends (the latter for
//! testing).
//!
//! Pipeline run status writes are guarded: once a run reaches a
//! terminal status (`Ok`, `Failed`, `Cancelled`) further status writes
//! are rejected. Non-terminal re-advancement is legal because a deploy
//! retry re-enters at the first stage and re-applies earlier statuses.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(PIPELINE_RUNS).map_err(map_err!(Table))?;
        txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
        txn.open_table(TEMPLATE_RELEASES).map_err(map_err!(Table))?;
        txn.open_table(REGIONS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Pipeline runs ──────────────────────────────────────────────

    /// Insert a new pipeline run, assigning the next free id.
    pub fn create_pipeline_run(&self, run: &PipelineRun) -> StateResult<PipelineRun> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let created;
        {
            let mut table = txn.open_table(PIPELINE_RUNS).map_err(map_err!(Table))?;
            let next_id = table
                .last()
                .map_err(map_err!(Read))?
                .map(|(k, _)| k.value() + 1)
                .unwrap_or(1);
            let mut run = run.clone();
            run.id = next_id;
            if run.started_at.is_none() {
                run.started_at = Some(epoch_secs());
            }
            let value = serde_json::to_vec(&run).map_err(map_err!(Serialize))?;
            table
                .insert(next_id, value.as_slice())
                .map_err(map_err!(Write))?;
            created = run;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = created.id, cluster_id = created.cluster_id, "pipeline run created");
        Ok(created)
    }

    /// Get a pipeline run by id.
    pub fn get_pipeline_run(&self, id: PipelineRunId) -> StateResult<Option<PipelineRun>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PIPELINE_RUNS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let run: PipelineRun =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(run))
            }
            None => Ok(None),
        }
    }

    /// List all pipeline runs belonging to a cluster, oldest first.
    pub fn list_pipeline_runs_for_cluster(
        &self,
        cluster_id: ClusterId,
    ) -> StateResult<Vec<PipelineRun>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(PIPELINE_RUNS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let run: PipelineRun =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if run.cluster_id == cluster_id {
                results.push(run);
            }
        }
        Ok(results)
    }

    /// Record the config commit a run wrote to the gitops branch.
    pub fn update_config_commit(
        &self,
        id: PipelineRunId,
        commit: &str,
    ) -> StateResult<PipelineRun> {
        self.mutate_pipeline_run(id, |run| {
            run.config_commit = commit.to_string();
            Ok(())
        })
    }

    /// Advance a run's status. Rejects writes out of a terminal status
    /// and stamps `finished_at` when the run reaches one.
    pub fn update_pipeline_status(
        &self,
        id: PipelineRunId,
        status: PipelineStatus,
    ) -> StateResult<PipelineRun> {
        self.mutate_pipeline_run(id, |run| {
            if run.status.is_terminal() {
                return Err(StateError::InvalidTransition(format!(
                    "pipeline run {} is already {}",
                    run.id, run.status
                )));
            }
            run.status = status;
            if status.is_terminal() {
                run.finished_at = Some(epoch_secs());
            }
            Ok(())
        })
    }

    /// Read-modify-write a pipeline run under one write transaction.
    fn mutate_pipeline_run<F>(&self, id: PipelineRunId, f: F) -> StateResult<PipelineRun>
    where
        F: FnOnce(&mut PipelineRun) -> StateResult<()>,
    {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(PIPELINE_RUNS).map_err(map_err!(Table))?;
            let mut run: PipelineRun = match table.get(id).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?
                }
                None => {
                    return Err(StateError::NotFound(format!("pipeline run {id}")));
                }
            };
            f(&mut run)?;
            let value = serde_json::to_vec(&run).map_err(map_err!(Serialize))?;
            table.insert(id, value.as_slice()).map_err(map_err!(Write))?;
            updated = run;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id, status = %updated.status, "pipeline run updated");
        Ok(updated)
    }

    // ── Clusters ───────────────────────────────────────────────────

    /// Insert or update a cluster record.
    pub fn put_cluster(&self, cluster: &ClusterRecord) -> StateResult<()> {
        let value = serde_json::to_vec(cluster).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            table
                .insert(cluster.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = cluster.id, name = %cluster.name, "cluster stored");
        Ok(())
    }

    /// Get a cluster by id.
    pub fn get_cluster(&self, id: ClusterId) -> StateResult<Option<ClusterRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let cluster: ClusterRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(cluster))
            }
            None => Ok(None),
        }
    }

    /// Update an existing cluster record, bumping `updated_at`.
    pub fn update_cluster(&self, cluster: &ClusterRecord) -> StateResult<ClusterRecord> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let updated;
        {
            let mut table = txn.open_table(CLUSTERS).map_err(map_err!(Table))?;
            if table.get(cluster.id).map_err(map_err!(Read))?.is_none() {
                return Err(StateError::NotFound(format!("cluster {}", cluster.id)));
            }
            let mut cluster = cluster.clone();
            cluster.updated_at = epoch_secs();
            let value = serde_json::to_vec(&cluster).map_err(map_err!(Serialize))?;
            table
                .insert(cluster.id, value.as_slice())
                .map_err(map_err!(Write))?;
            updated = cluster;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = updated.id, status = ?updated.status, "cluster updated");
        Ok(updated)
    }

    // ── Applications ───────────────────────────────────────────────

    /// Insert or update an application.
    pub fn put_application(&self, app: &Application) -> StateResult<()> {
        let value = serde_json::to_vec(app).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
            table
                .insert(app.id, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get an application by id.
    pub fn get_application(&self, id: ApplicationId) -> StateResult<Option<Application>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(APPLICATIONS).map_err(map_err!(Table))?;
        match table.get(id).map_err(map_err!(Read))? {
            Some(guard) => {
                let app: Application =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(app))
            }
            None => Ok(None),
        }
    }

    // ── Template releases ──────────────────────────────────────────

    /// Insert or update a template release.
    pub fn put_template_release(&self, tr: &TemplateRelease) -> StateResult<()> {
        let key = tr.table_key();
        let value = serde_json::to_vec(tr).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(TEMPLATE_RELEASES).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a release of a template by template name and release name.
    pub fn get_template_release(
        &self,
        template: &str,
        release: &str,
    ) -> StateResult<Option<TemplateRelease>> {
        let key = format!("{template}/{release}");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(TEMPLATE_RELEASES).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let tr: TemplateRelease =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(tr))
            }
            None => Ok(None),
        }
    }

    // ── Regions ────────────────────────────────────────────────────

    /// Insert or update a region.
    pub fn put_region(&self, region: &RegionEntity) -> StateResult<()> {
        let value = serde_json::to_vec(region).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(REGIONS).map_err(map_err!(Table))?;
            table
                .insert(region.name.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get the infrastructure entity for a region by name.
    pub fn get_region(&self, name: &str) -> StateResult<Option<RegionEntity>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REGIONS).map_err(map_err!(Table))?;
        match table.get(name).map_err(map_err!(Read))? {
            Some(guard) => {
                let region: RegionEntity =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(region))
            }
            None => Ok(None),
        }
    }
}

/// Current unix time in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
