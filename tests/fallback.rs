// tests/fallback.rs

//! Fallback ordering across strategies
//!
//! Strategies here are test doubles wrapped around the in-process ZIP
//! strategy so the number of times each one runs can be observed.

mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use vsixpatch::orchestrator::{AttemptOutcome, Orchestrator, OrchestratorState};
use vsixpatch::pipeline::PipelineOptions;
use vsixpatch::strategy::{LibraryZipStrategy, Strategy, VsixLayoutStrategy};
use vsixpatch::tools::Capabilities;
use vsixpatch::{Error, Result};

/// How a counted strategy behaves when it is run
#[derive(Clone, Copy)]
enum Behaviour {
    /// Delegate to the in-process ZIP strategy
    Work,
    /// Fail during extraction
    FailExtract,
    /// Extract fine, fail while repackaging
    FailRepackage,
}

struct Counted {
    name: &'static str,
    behaviour: Behaviour,
    tools: &'static [&'static str],
    runs: Arc<AtomicUsize>,
}

impl Counted {
    fn boxed(
        name: &'static str,
        behaviour: Behaviour,
        tools: &'static [&'static str],
    ) -> (Box<dyn Strategy>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let strategy: Box<dyn Strategy> = Box::new(Counted {
            name,
            behaviour,
            tools,
            runs: runs.clone(),
        });
        (strategy, runs)
    }
}

impl Strategy for Counted {
    fn name(&self) -> &str {
        self.name
    }

    fn required_tools(&self) -> &[&'static str] {
        self.tools
    }

    fn extract(&self, zip: &Path, dest: &Path) -> Result<()> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::FailExtract => Err(Error::ExternalToolFailed {
                tool: "unzip".to_string(),
                code: 9,
                stderr: "cannot find zipfile directory".to_string(),
            }),
            _ => LibraryZipStrategy.extract(zip, dest),
        }
    }

    fn locate_manifest(&self, root: &Path, manifest_name: &str) -> Option<PathBuf> {
        LibraryZipStrategy.locate_manifest(root, manifest_name)
    }

    fn repackage(&self, root: &Path, out: &Path) -> Result<()> {
        match self.behaviour {
            Behaviour::FailRepackage => Err(Error::RepackageIo("disk full".to_string())),
            _ => LibraryZipStrategy.repackage(root, out),
        }
    }
}

fn sample_archive(dir: &Path) -> PathBuf {
    write_plain_vsix(
        dir,
        "pub.ext@1.0.0.vsix",
        &[
            ("extension/package.json", br#"{"engines":{"vscode":"^1.50.0"}}"#),
            ("extension/main.js", b"// main"),
        ],
    )
}

fn options() -> PipelineOptions {
    PipelineOptions::new("^1.99.0", "vscode")
}

#[test]
fn test_first_success_stops_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let archive = sample_archive(dir.path());

    let (first, first_runs) = Counted::boxed("first", Behaviour::Work, &[]);
    let (second, second_runs) = Counted::boxed("second", Behaviour::Work, &[]);
    let orchestrator = Orchestrator::new(vec![first, second], Capabilities::default(), options());

    let outcome = orchestrator.process(&archive);

    assert_eq!(first_runs.load(Ordering::SeqCst), 1);
    assert_eq!(second_runs.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.attempts.len(), 1);
    assert_eq!(
        outcome.state,
        OrchestratorState::Succeeded {
            strategy: "first".to_string(),
            previous: Some("^1.50.0".to_string()),
            current: "^1.99.0".to_string(),
        }
    );
}

#[test]
fn test_failures_fall_through_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let archive = sample_archive(dir.path());
    let original = std::fs::read(&archive).unwrap();

    let (extract_fails, a) = Counted::boxed("extract-fails", Behaviour::FailExtract, &[]);
    let (repack_fails, b) = Counted::boxed("repack-fails", Behaviour::FailRepackage, &[]);
    let (works, c) = Counted::boxed("works", Behaviour::Work, &[]);
    let (never, d) = Counted::boxed("never", Behaviour::Work, &[]);
    let orchestrator = Orchestrator::new(
        vec![extract_fails, repack_fails, works, never],
        Capabilities::default(),
        options(),
    );

    let outcome = orchestrator.process(&archive);

    assert_eq!(
        [a, b, c, d].map(|n| n.load(Ordering::SeqCst)),
        [1, 1, 1, 0]
    );
    assert!(outcome.is_success());
    assert!(matches!(outcome.attempts[0].outcome, AttemptOutcome::Failed(_)));
    assert_eq!(
        outcome.attempts[1].outcome,
        AttemptOutcome::Failed("Failed to write archive: disk full".to_string())
    );
    assert!(outcome.attempts[2].succeeded());

    assert_ne!(std::fs::read(&archive).unwrap(), original);
    assert_eq!(
        read_json_entry(&archive, "extension/package.json")["engines"]["vscode"],
        "^1.99.0"
    );
}

#[test]
fn test_repackage_failure_leaves_archive_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let archive = sample_archive(dir.path());
    let original = std::fs::read(&archive).unwrap();

    let (repack_fails, _) = Counted::boxed("repack-fails", Behaviour::FailRepackage, &[]);
    let orchestrator = Orchestrator::new(vec![repack_fails], Capabilities::default(), options());

    let outcome = orchestrator.process(&archive);

    assert!(!outcome.is_success());
    assert_eq!(std::fs::read(&archive).unwrap(), original);
    assert_eq!(
        outcome.state,
        OrchestratorState::Exhausted {
            reason: "Failed to write archive: disk full".to_string(),
            manifest_missing: false,
        }
    );
}

#[test]
fn test_strategy_with_missing_tool_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let archive = sample_archive(dir.path());

    let (needs_vsce, vsce_runs) = Counted::boxed("needs-vsce", Behaviour::Work, &["vsce"]);
    let (fallback, fallback_runs) = Counted::boxed("fallback", Behaviour::Work, &[]);
    let orchestrator = Orchestrator::new(
        vec![needs_vsce, fallback],
        Capabilities::from_available(["unzip", "zip"]),
        options(),
    );

    let outcome = orchestrator.process(&archive);

    assert_eq!(vsce_runs.load(Ordering::SeqCst), 0);
    assert_eq!(fallback_runs.load(Ordering::SeqCst), 1);
    assert_eq!(
        outcome.attempts[0].outcome,
        AttemptOutcome::Skipped("vsce not found on PATH".to_string())
    );
    assert_eq!(outcome.strategies_tried().collect::<Vec<_>>(), vec!["fallback"]);
}

#[test]
fn test_layout_strategy_declines_non_marketplace_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_plain_vsix(
        dir.path(),
        "pub.plain@1.0.0.vsix",
        &[("package.json", br#"{"engines":{"vscode":"^1.0.0"}}"#)],
    );

    let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(VsixLayoutStrategy)];
    let orchestrator = Orchestrator::new(strategies, Capabilities::default(), options());
    let outcome = orchestrator.process(&archive);

    assert!(matches!(outcome.attempts[0].outcome, AttemptOutcome::Skipped(_)));
    assert_eq!(
        outcome.state,
        OrchestratorState::Exhausted {
            reason: "No applicable strategy".to_string(),
            manifest_missing: false,
        }
    );
}

#[test]
fn test_layout_strategy_prefers_extension_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let owned = marketplace_entries(r#"{"engines":{"vscode":"^1.70.0"}}"#);
    let mut entries = as_entries(&owned);
    entries.push(("extension/node_modules/dep/package.json", br#"{"name":"dep"}"#.as_slice()));
    let archive = write_plain_vsix(dir.path(), "pub.market@3.1.4.vsix", &entries);

    let strategies: Vec<Box<dyn Strategy>> = vec![Box::new(VsixLayoutStrategy)];
    let orchestrator = Orchestrator::new(strategies, Capabilities::default(), options());
    let outcome = orchestrator.process(&archive);

    assert!(outcome.is_success());
    assert_eq!(
        read_json_entry(&archive, "extension/package.json")["engines"]["vscode"],
        "^1.99.0"
    );
    assert_eq!(
        read_json_entry(&archive, "extension/node_modules/dep/package.json"),
        serde_json::json!({"name": "dep"})
    );
}
