//! `EnrichmentStore`: configuration, metrics and per-call connections.
//!
//! Every public operation opens its own connection and runs in its own
//! transaction, so a store can be shared across threads (`Arc<EnrichmentStore>`)
//! without any call ever sharing a live transaction with another.

use crate::config::StoreConfig;
use crate::db;
use crate::enrichment::{self, IngestOptions};
use crate::errors::Result;
use crate::microbatch::CancelToken;
use crate::migrations::apply_migrations;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;
use vulnstore_core::metrics::{NoopMetrics, StoreMetrics};
use vulnstore_core::model::{EnrichmentRecord, Fingerprint, IngestionRun, RunRef};
use vulnstore_core::{log_op_end, log_op_error, log_op_start};

pub struct EnrichmentStore {
    config: StoreConfig,
    metrics: Arc<dyn StoreMetrics>,
}

impl std::fmt::Debug for EnrichmentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EnrichmentStore {
    /// Open the database described by `config`, applying pending migrations.
    ///
    /// # Errors
    ///
    /// - `Config`: the configuration is invalid
    /// - `Persistence`: the database could not be opened or migrated
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::with_metrics(config, Arc::new(NoopMetrics))
    }

    /// Like [`EnrichmentStore::open`], reporting query timings to `metrics`.
    ///
    /// # Errors
    ///
    /// Same as [`EnrichmentStore::open`].
    pub fn with_metrics(config: StoreConfig, metrics: Arc<dyn StoreMetrics>) -> Result<Self> {
        config.validate()?;
        let mut conn = db::connect(&config)?;
        apply_migrations(&mut conn)?;
        tracing::debug!(path = %config.path.display(), "Enrichment store opened");
        Ok(Self { config, metrics })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection> {
        db::connect(&self.config)
    }

    /// Ingest `records` as a new run for `updater`. See
    /// [`enrichment::update_enrichments`].
    ///
    /// # Errors
    ///
    /// Any failure aborts the whole run; nothing from it becomes visible.
    pub fn update_enrichments(
        &self,
        updater: &str,
        fingerprint: &Fingerprint,
        records: &[EnrichmentRecord],
    ) -> Result<RunRef> {
        self.ingest(updater, fingerprint, records, &IngestOptions::default())
    }

    /// Like [`EnrichmentStore::update_enrichments`], abandoning the run as soon
    /// as `cancel` is triggered.
    ///
    /// # Errors
    ///
    /// `Cancelled` when the token fires before commit, plus everything
    /// [`EnrichmentStore::update_enrichments`] can return.
    pub fn update_enrichments_cancellable(
        &self,
        updater: &str,
        fingerprint: &Fingerprint,
        records: &[EnrichmentRecord],
        cancel: &CancelToken,
    ) -> Result<RunRef> {
        let options = IngestOptions {
            cancel: Some(cancel.clone()),
        };
        self.ingest(updater, fingerprint, records, &options)
    }

    fn ingest(
        &self,
        updater: &str,
        fingerprint: &Fingerprint,
        records: &[EnrichmentRecord],
        options: &IngestOptions,
    ) -> Result<RunRef> {
        let start = Instant::now();
        log_op_start!(
            enrichment::ingest::OP,
            updater = updater,
            records = records.len()
        );

        let result = self.connect().and_then(|mut conn| {
            enrichment::update_enrichments(
                &mut conn,
                &self.config,
                self.metrics.as_ref(),
                updater,
                fingerprint,
                records,
                options,
            )
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(run_ref) => log_op_end!(
                enrichment::ingest::OP,
                duration_ms = duration_ms,
                updater = updater,
                run_ref = %run_ref
            ),
            Err(e) => log_op_error!(
                enrichment::ingest::OP,
                e,
                duration_ms = duration_ms,
                updater = updater
            ),
        }
        result
    }

    /// Records of `updater`'s latest committed run overlapping `tags`.
    ///
    /// # Errors
    ///
    /// Store failures only; an unknown updater is an empty result.
    pub fn get_enrichment(&self, updater: &str, tags: &[String]) -> Result<Vec<EnrichmentRecord>> {
        let start = Instant::now();
        log_op_start!(enrichment::query::OP, updater = updater);

        let result = self.connect().and_then(|mut conn| {
            enrichment::get_enrichment(&mut conn, self.metrics.as_ref(), updater, tags)
        });

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(records) => log_op_end!(
                enrichment::query::OP,
                duration_ms = duration_ms,
                updater = updater,
                returned = records.len()
            ),
            Err(e) => log_op_error!(
                enrichment::query::OP,
                e,
                duration_ms = duration_ms,
                updater = updater
            ),
        }
        result
    }

    /// # Errors
    ///
    /// Store failures only.
    pub fn latest_run(&self, updater: &str) -> Result<Option<IngestionRun>> {
        let conn = self.connect()?;
        enrichment::latest_run(&conn, updater)
    }

    /// # Errors
    ///
    /// Store failures only.
    pub fn list_runs(&self, updater: &str) -> Result<Vec<IngestionRun>> {
        let conn = self.connect()?;
        enrichment::list_runs(&conn, updater)
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown reference.
    pub fn run_record_count(&self, run_ref: &RunRef) -> Result<usize> {
        let conn = self.connect()?;
        enrichment::run_record_count(&conn, run_ref)
    }
}
