//! End-to-end tests for the Cortex engine on small on-disk projects

use cortex::audit::{detect_changes, ChangeAuditor};
use cortex::config::{CortexConfig, ScanConfig};
use cortex::graph::NodeKind;
use cortex::models::{Severity, SmellKind, TelemetryEventType};
use cortex::{Cortex, CortexError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn config_for(state_dir: &Path) -> CortexConfig {
    let mut config = CortexConfig::default();
    config.state.dir = Some(state_dir.to_path_buf());
    config
}

/// Project dir plus a separate checkpoint dir
fn project(files: &[(&str, &str)]) -> (TempDir, TempDir, Cortex) {
    let dir = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    for (rel, content) in files {
        write(dir.path(), rel, content);
    }
    let cortex = Cortex::open(dir.path(), config_for(state.path())).unwrap();
    (dir, state, cortex)
}

/// 60-line function with five nested `if` levels
fn deep_function() -> String {
    let mut src = String::from("def process(a, b, c, d, e):\n");
    let mut indent = String::from("    ");
    for level in 0..5 {
        src.push_str(&format!("{}if a > {}:\n", indent, level));
        indent.push_str("    ");
    }
    src.push_str(&format!("{}return 1\n", indent));
    for i in 0..53 {
        src.push_str(&format!("    x{} = {}\n", i, i));
    }
    src.push_str("    return 0\n");
    src
}

#[test]
fn test_import_cycle_is_reported() {
    let (_dir, _state, cortex) = project(&[
        ("a.py", "import b\n"),
        ("b.py", "import c\n"),
        ("c.py", "import a\n"),
    ]);
    cortex.scan(".").unwrap();

    let cycles = cortex.cycles();
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].clone();
    members.sort();
    assert_eq!(members, vec!["a.py", "b.py", "c.py"]);
    assert_eq!(cortex.health_report(None).cycles.len(), 1);
}

#[test]
fn test_long_deep_function_smells_and_risk() {
    let src = deep_function();
    assert!(src.lines().count() >= 60);
    let (_dir, _state, cortex) = project(&[("worker.py", &src)]);
    cortex.scan(".").unwrap();

    let id = "worker.py:process";
    let metrics = cortex.metrics(id).unwrap();
    assert!(metrics.lines_of_code() >= 60);
    assert!(metrics.max_nesting() >= 5);
    assert_eq!(metrics.cyclomatic(), 6);

    let kinds: Vec<_> = cortex
        .smells(None)
        .into_iter()
        .filter(|s| s.node_id == id)
        .map(|s| s.smell_kind)
        .collect();
    assert!(kinds.contains(&SmellKind::LongMethod));
    assert!(kinds.contains(&SmellKind::DeepNesting));

    let risk = cortex.risk(id).unwrap();
    assert!(risk
        .contributing_factors
        .iter()
        .any(|f| f.starts_with("Long implementation")));
    assert!(risk
        .contributing_factors
        .iter()
        .any(|f| f.starts_with("Deep nesting")));
    assert!(risk.score > 0.0 && risk.score <= 100.0);

    let critical = cortex.smells(Some(Severity::Critical));
    assert!(critical.iter().all(|s| s.severity == Severity::Critical));
}

#[test]
fn test_telemetry_limit_returns_newest_first() {
    let (_dir, _state, cortex) = project(&[("a.py", "def f():\n    pass\n")]);
    for i in 0..10 {
        let mut metadata = HashMap::new();
        metadata.insert("seq".to_string(), serde_json::json!(i));
        cortex
            .record_telemetry("a.py:f", TelemetryEventType::Execution, metadata, Some("s1".into()))
            .unwrap();
    }

    let recent = cortex.telemetry(Some("a.py:f"), 3);
    let seqs: Vec<_> = recent.iter().map(|e| e.metadata["seq"].as_i64().unwrap()).collect();
    assert_eq!(seqs, vec![9, 8, 7]);
    assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    assert!(cortex.telemetry(Some("other"), 3).is_empty());
}

#[test]
fn test_impact_grows_with_depth() {
    let (_dir, _state, cortex) = project(&[
        ("base.py", "def core():\n    return 1\n"),
        ("mid.py", "import base\n"),
        ("top.py", "import mid\n"),
        ("app.py", "import top\nimport base\n"),
    ]);
    cortex.scan(".").unwrap();

    assert!(cortex.impact("base.py", 0).unwrap().dependents.is_empty());
    let mut previous: Vec<String> = Vec::new();
    for depth in 1..=4 {
        let ids: Vec<String> = cortex
            .impact("base.py", depth)
            .unwrap()
            .dependents
            .into_iter()
            .map(|d| d.node_id)
            .collect();
        assert!(previous.iter().all(|p| ids.contains(p)));
        previous = ids;
    }
    // app.py is reached directly, so its distance is 1
    let report = cortex.impact("base.py", 3).unwrap();
    let app = report.dependents.iter().find(|d| d.node_id == "app.py").unwrap();
    assert_eq!(app.distance, 1);
    assert!(matches!(
        cortex.impact("nope.py", 2),
        Err(CortexError::NodeNotFound(_))
    ));
}

#[test]
fn test_detect_changes_between_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "x = 1\n");
    write(dir.path(), "b.py", "y = 2\n");
    let auditor = ChangeAuditor::new(&ScanConfig::default());

    let first = auditor.snapshot(dir.path()).unwrap();
    let mut initial = detect_changes(None, &first);
    initial.sort();
    assert_eq!(initial, vec!["a.py", "b.py"]);

    let same = auditor.snapshot(dir.path()).unwrap();
    assert_eq!(first.merkle_root(), same.merkle_root());
    assert!(detect_changes(Some(&first), &same).is_empty());

    write(dir.path(), "a.py", "x = 3\n");
    fs::remove_file(dir.path().join("b.py")).unwrap();
    let changed = auditor.snapshot(dir.path()).unwrap();
    let mut diff = detect_changes(Some(&first), &changed);
    diff.sort();
    assert_eq!(diff, vec!["a.py", "b.py"]);
    assert_ne!(first.merkle_root(), changed.merkle_root());
}

#[test]
fn test_scan_outside_root_is_denied() {
    let (dir, _state, cortex) = project(&[("a.py", "")]);
    write(dir.path(), ".git/hooks/x.py", "");

    assert!(matches!(
        cortex.scan(".."),
        Err(CortexError::PermissionDenied { .. })
    ));
    assert!(matches!(
        cortex.scan(".git"),
        Err(CortexError::PermissionDenied { .. })
    ));
    assert!(cortex.scan_history(10).is_empty());
}

#[test]
fn test_concurrent_scans_single_writer() {
    let mut files = Vec::new();
    let bodies: Vec<String> = (0..200)
        .map(|i| format!("def f{}(x):\n    if x:\n        return {}\n    return 0\n", i, i))
        .collect();
    let names: Vec<String> = (0..200).map(|i| format!("m{}.py", i)).collect();
    for (name, body) in names.iter().zip(&bodies) {
        files.push((name.as_str(), body.as_str()));
    }
    let (_dir, _state, cortex) = project(&files);
    let cortex = Arc::new(cortex);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let c = Arc::clone(&cortex);
            std::thread::spawn(move || c.scan("."))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert!(ok >= 1);
    assert!(results
        .iter()
        .all(|r| r.is_ok() || matches!(r, Err(CortexError::ScanInProgress))));
    assert_eq!(cortex.scan_history(100).len(), ok);
    assert_eq!(cortex.snapshot().graph.nodes_by_kind(NodeKind::File).len(), 200);
}

#[test]
fn test_scan_history_is_newest_first_and_capped() {
    let dir = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "");
    let mut config = config_for(state.path());
    config.history.max_scans = 2;
    let cortex = Cortex::open(dir.path(), config).unwrap();

    let ids: Vec<String> = (0..3).map(|_| cortex.scan(".").unwrap().scan_id).collect();
    let history: Vec<String> = cortex.scan_history(10).into_iter().map(|s| s.scan_id).collect();
    assert_eq!(history, vec![ids[2].clone(), ids[1].clone()]);
    assert_eq!(cortex.scan_history(1).len(), 1);
}

#[test]
fn test_subscribers_are_notified() {
    let (_dir, _state, cortex) = project(&[("a.py", "def f():\n    pass\n")]);
    let scans = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&scans);
    cortex.subscribe(move |event| {
        if let cortex::CortexEvent::ScanCompleted(stats) = event {
            assert_eq!(stats.files_scanned, 1);
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });
    cortex.scan(".").unwrap();
    cortex.scan(".").unwrap();
    assert_eq!(scans.load(Ordering::SeqCst), 2);
}

#[test]
fn test_checkpoint_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "x = 1\n");

    let root = {
        let cortex = Cortex::open(dir.path(), config_for(state.path())).unwrap();
        cortex.scan(".").unwrap().merkle_root
    };

    write(dir.path(), "b.py", "y = 1\n");
    let reopened = Cortex::open(dir.path(), config_for(state.path())).unwrap();
    let report = reopened.audit().unwrap();
    assert_eq!(report.previous_root.as_deref(), Some(root.as_str()));
    assert_eq!(report.changes.added, vec!["b.py"]);
    assert!(report.changes.modified.is_empty());
}

#[test]
fn test_corrupt_checkpoint_is_moved_aside() {
    let dir = tempfile::tempdir().unwrap();
    let state = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "x = 1\n");
    fs::write(state.path().join("audit_snapshot.json"), "{not json").unwrap();

    let cortex = Cortex::open(dir.path(), config_for(state.path())).unwrap();
    assert!(cortex.audit().unwrap().previous_root.is_none());

    let backups = fs::read_dir(state.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
        .count();
    assert_eq!(backups, 1);

    cortex.scan(".").unwrap();
    assert!(state.path().join("audit_snapshot.json").exists());
}
