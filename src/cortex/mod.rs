//! The Cortex facade
//!
//! One `Cortex` owns the analysis state for one project root. Scans run the
//! whole pipeline (scanner, graph, metrics, smells, risk, cycles, audit
//! snapshot) off to the side and publish the result by swapping an
//! `Arc<CortexState>`; every query works on whichever state was current when
//! it started.
//!
//! ```text
//! scan(root) ──► PathGuard ──► try_lock ──► Scanner ──► CortexState::build
//!                                              │                 │
//!                                     ChangeAuditor         swap Arc
//!                                              │                 │
//!                                        Checkpoint      history + notify
//! ```

mod guard;
mod queries;
mod state;
mod telemetry;

pub use guard::PathGuard;
pub use queries::{
    Dependent, ExportLink, ExportNode, ExportStats, GraphExport, HealthReport, ImpactReport,
    MatchKind, NodeCounts, SearchHit, MAX_IMPACT_DEPTH,
};
pub use state::CortexState;
pub use telemetry::TelemetryLog;

use crate::audit::{classify_changes, AuditSnapshot, ChangeAuditor, ChangeSet, Checkpoint};
use crate::config::CortexConfig;
use crate::error::{CortexError, Result};
use crate::graph::{NodeKind, TreeNode};
use crate::metrics::EntityMetrics;
use crate::models::{
    CodeSmell, RiskAssessment, ScanStats, Severity, TelemetryEvent, TelemetryEventType,
    TelemetryRecord,
};
use crate::scanner::Scanner;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub type SubscriptionId = u64;

type Callback = Arc<dyn Fn(&CortexEvent) + Send + Sync>;

/// Notifications delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum CortexEvent {
    ScanCompleted(ScanStats),
    TelemetryRecorded(TelemetryEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Nothing changed since the last scan
    Unchanged { merkle_root: String },
    Scanned(ScanStats),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub merkle_root: String,
    pub previous_root: Option<String>,
    pub files: usize,
    pub changes: ChangeSet,
}

pub struct Cortex {
    root: PathBuf,
    config: CortexConfig,
    guard: PathGuard,
    state: RwLock<Arc<CortexState>>,
    scan_lock: Mutex<()>,
    telemetry: RwLock<TelemetryLog>,
    history: RwLock<VecDeque<ScanStats>>,
    last_snapshot: RwLock<Option<AuditSnapshot>>,
    last_root: RwLock<Option<PathBuf>>,
    checkpoint: Option<Checkpoint>,
    subscribers: RwLock<BTreeMap<SubscriptionId, Callback>>,
    next_subscription: AtomicU64,
}

impl Cortex {
    /// Open a project; no scan is run yet
    pub fn open(root: impl AsRef<Path>, config: CortexConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| {
            CortexError::InvalidInput(format!("cannot open project {}: {}", root.display(), e))
        })?;
        if !root.is_dir() {
            return Err(CortexError::InvalidInput(format!(
                "project root {} is not a directory",
                root.display()
            )));
        }

        let checkpoint = config
            .state
            .checkpoint
            .then(|| Checkpoint::for_project(&root, &config.state));
        let last_snapshot = checkpoint.as_ref().and_then(Checkpoint::load);
        if let Some(snapshot) = &last_snapshot {
            debug!("Restored audit snapshot {}", snapshot.merkle_root());
        }

        Ok(Self {
            guard: PathGuard::new(root.clone(), &config.scan),
            root,
            config,
            state: RwLock::new(Arc::new(CortexState::empty())),
            scan_lock: Mutex::new(()),
            telemetry: RwLock::new(TelemetryLog::new()),
            history: RwLock::new(VecDeque::new()),
            last_snapshot: RwLock::new(last_snapshot),
            last_root: RwLock::new(None),
            checkpoint,
            subscribers: RwLock::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &CortexConfig {
        &self.config
    }

    /// The current published state
    pub fn snapshot(&self) -> Arc<CortexState> {
        Arc::clone(&self.state.read())
    }

    // ==================== Scanning ====================

    /// Full scan of `root` (relative paths resolve against the project root)
    pub fn scan(&self, root: impl AsRef<Path>) -> Result<ScanStats> {
        let root = self.guard.check(root.as_ref())?;
        let _lock = self.scan_lock.try_lock().ok_or(CortexError::ScanInProgress)?;
        self.run_scan(root, None)
    }

    /// Rescan only if the tree changed since the last scan
    pub fn refresh(&self) -> Result<ScanOutcome> {
        let _lock = self.scan_lock.try_lock().ok_or(CortexError::ScanInProgress)?;
        let root = self.scan_root();
        let current = ChangeAuditor::new(&self.config.scan).snapshot(&root)?;

        let unchanged = self.snapshot().has_graph()
            && self
                .last_snapshot
                .read()
                .as_ref()
                .is_some_and(|prev| prev.merkle_root() == current.merkle_root());
        if unchanged {
            debug!("Refresh: {} unchanged", root.display());
            return Ok(ScanOutcome::Unchanged {
                merkle_root: current.merkle_root().to_string(),
            });
        }

        self.run_scan(root, Some(current)).map(ScanOutcome::Scanned)
    }

    /// Compare the tree on disk with the last recorded snapshot
    pub fn audit(&self) -> Result<AuditReport> {
        let current = ChangeAuditor::new(&self.config.scan).snapshot(&self.scan_root())?;
        let previous = self.last_snapshot.read();
        Ok(AuditReport {
            merkle_root: current.merkle_root().to_string(),
            previous_root: previous.as_ref().map(|p| p.merkle_root().to_string()),
            files: current.len(),
            changes: classify_changes(previous.as_ref(), &current),
        })
    }

    fn scan_root(&self) -> PathBuf {
        self.last_root
            .read()
            .clone()
            .unwrap_or_else(|| self.root.clone())
    }

    /// Caller holds `scan_lock`
    fn run_scan(&self, root: PathBuf, snapshot: Option<AuditSnapshot>) -> Result<ScanStats> {
        let started_at = Utc::now();
        let timer = Instant::now();
        info!("Scanning {}", root.display());

        let output = Scanner::new(&self.config.scan).scan(&root)?;
        let snapshot = match snapshot {
            Some(s) => s,
            None => ChangeAuditor::new(&self.config.scan).snapshot(&root)?,
        };
        let mut state = CortexState::build(output)?;

        let stats = ScanStats {
            scan_id: uuid::Uuid::new_v4().to_string(),
            root: root.display().to_string(),
            files_scanned: state.files_scanned,
            skipped: state.skipped.clone(),
            total_nodes: state.graph.node_count(),
            total_edges: state.graph.edge_count(),
            total_smells: state.smells.len(),
            cycle_count: state.cycles.len(),
            merkle_root: snapshot.merkle_root().to_string(),
            started_at,
            elapsed_ms: timer.elapsed().as_millis() as u64,
        };
        state.stats = Some(stats.clone());

        *self.state.write() = Arc::new(state);
        {
            let mut history = self.history.write();
            history.push_front(stats.clone());
            history.truncate(self.config.history.max_scans.max(1));
        }

        if let Some(checkpoint) = &self.checkpoint {
            if let Err(e) = checkpoint.save(&snapshot) {
                warn!("Failed to save checkpoint {}: {}", checkpoint.path().display(), e);
            }
        }
        *self.last_snapshot.write() = Some(snapshot);
        *self.last_root.write() = Some(root);

        info!(
            "Scan complete: {} files, {} nodes, {} edges, {} smells in {}ms",
            stats.files_scanned, stats.total_nodes, stats.total_edges, stats.total_smells, stats.elapsed_ms
        );
        self.notify(&CortexEvent::ScanCompleted(stats.clone()));
        Ok(stats)
    }

    // ==================== Queries ====================

    pub fn graph_export(&self) -> GraphExport {
        self.snapshot().graph_export()
    }

    pub fn hierarchy(&self, node_id: &str) -> Result<TreeNode> {
        self.snapshot().hierarchy(node_id)
    }

    /// `top_n` defaults to `[health] top_n`
    pub fn health_report(&self, top_n: Option<usize>) -> HealthReport {
        self.snapshot()
            .health_report(top_n.unwrap_or(self.config.health.top_n))
    }

    pub fn impact(&self, node_id: &str, max_depth: usize) -> Result<ImpactReport> {
        self.snapshot().impact(node_id, max_depth)
    }

    pub fn search(&self, query: &str, kind: Option<NodeKind>, limit: usize) -> Result<Vec<SearchHit>> {
        self.snapshot().search(query, kind, limit)
    }

    pub fn metrics(&self, node_id: &str) -> Result<EntityMetrics> {
        self.snapshot().metrics_for(node_id)
    }

    pub fn smells(&self, severity: Option<Severity>) -> Vec<CodeSmell> {
        self.snapshot().smells_with(severity)
    }

    pub fn risk(&self, node_id: &str) -> Result<RiskAssessment> {
        self.snapshot().risk_for(node_id)
    }

    pub fn cycles(&self) -> Vec<Vec<String>> {
        self.snapshot().cycles.clone()
    }

    // ==================== Telemetry & history ====================

    pub fn record_telemetry(
        &self,
        node_id: &str,
        event_type: TelemetryEventType,
        metadata: HashMap<String, serde_json::Value>,
        session_id: Option<String>,
    ) -> Result<TelemetryEvent> {
        if node_id.trim().is_empty() {
            return Err(CortexError::InvalidInput("telemetry node_id is empty".to_string()));
        }

        let event = TelemetryEvent {
            id: uuid::Uuid::new_v4().to_string(),
            node_id: node_id.to_string(),
            event_type,
            metadata,
            session_id,
            timestamp: Utc::now(),
        };
        self.telemetry.write().push(event.clone());
        debug!("Telemetry {:?} for {}", event.event_type, event.node_id);

        self.notify(&CortexEvent::TelemetryRecorded(event.clone()));
        Ok(event)
    }

    pub fn record(&self, record: TelemetryRecord) -> Result<TelemetryEvent> {
        self.record_telemetry(
            &record.node_id,
            record.event_type,
            record.metadata,
            record.session_id,
        )
    }

    /// Most recent first
    pub fn telemetry(&self, node_id: Option<&str>, limit: usize) -> Vec<TelemetryEvent> {
        self.telemetry.read().recent(node_id, limit)
    }

    /// Most recent first
    pub fn scan_history(&self, limit: usize) -> Vec<ScanStats> {
        self.history.read().iter().take(limit).cloned().collect()
    }

    // ==================== Subscriptions ====================

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CortexEvent) + Send + Sync + 'static,
    {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().insert(id, Arc::new(callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    fn notify(&self, event: &CortexEvent) {
        // Callbacks run outside the lock so they may (un)subscribe
        let callbacks: Vec<Callback> = self.subscribers.read().values().cloned().collect();
        for callback in callbacks {
            callback(event);
        }
    }
}
