use crate::config::{Config, OutputFormat};
use crate::script::{run_step, Script, Step, StepOutput};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use treeweave_dom::Document;
use treeweave_patcher::{
    Bootstrap, FileSource, PatchedDocument, PatcherConfig, PendingFetch, Phase, PollOutcome,
};

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Edit stream document (`{"edits": [...]}`)
    #[arg(short, long)]
    pub edits: PathBuf,

    /// Initial tree snapshot (defaults to an empty document)
    #[arg(short, long)]
    pub snapshot: Option<PathBuf>,

    /// Local mutation script to replay while the stream is applied
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Print the final tree as HTML
    #[arg(long, conflicts_with = "json")]
    pub html: bool,

    /// Print the final tree as a JSON snapshot
    #[arg(long)]
    pub json: bool,

    /// Log protocol violations without collecting them
    #[arg(long)]
    pub no_violations: bool,
}

pub async fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut patcher_config = config.patcher.clone();
    if args.no_violations {
        patcher_config.report_violations = false;
    }
    let output = if args.json {
        OutputFormat::Json
    } else if args.html {
        OutputFormat::Html
    } else {
        config.output
    };
    debug!(config = ?patcher_config, ?output, "Resolved configuration");

    println!("{}", "🧵 Reconciling edit stream...".bright_blue().bold());
    let mut doc = reconcile(&args, patcher_config).await?;

    print_summary(&mut doc);

    println!();
    match output {
        OutputFormat::Html => println!("{}", doc.inner().to_html()),
        OutputFormat::Json => println!("{}", doc.inner().to_json()?),
    }

    Ok(())
}

/// Load the inputs, replay the script while the stream arrives and return the
/// patched document
async fn reconcile(args: &ApplyArgs, config: PatcherConfig) -> Result<PatchedDocument<Document>> {
    let tree = match &args.snapshot {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Cannot read snapshot {}", path.display()))?;
            Document::from_json(&json)?
        }
        None => Document::new(),
    };
    let script = match &args.script {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Cannot read script {}", path.display()))?;
            Script::from_json(&json)?
        }
        None => Script::default(),
    };

    let (mut doc, fetch) =
        Bootstrap::new(config).start(tree, FileSource::new(&args.edits))?;
    let mut fetch = Some(fetch);

    for (index, step) in script.steps.iter().enumerate() {
        if *step == Step::Poll {
            let outcome = match fetch.take() {
                Some(pending) => arrive(pending, &mut doc).await,
                None => Some(doc.poll()),
            };
            if let Some(outcome) = outcome {
                print_outcome(index, &outcome);
            }
            continue;
        }

        let result = run_step(&mut doc, step)
            .with_context(|| format!("Step {} ({}) failed", index, step.name()))?;
        print_step(index, step, &result);
    }

    if let Some(pending) = fetch.take() {
        if let Some(outcome) = arrive(pending, &mut doc).await {
            print_outcome(script.steps.len(), &outcome);
        }
    }

    Ok(doc)
}

/// Wait for the stream and apply it. A failed fetch is reported and leaves
/// the document intercepting.
async fn arrive(
    pending: PendingFetch,
    doc: &mut PatchedDocument<Document>,
) -> Option<PollOutcome> {
    match pending.wait(doc).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            eprintln!(
                "  {} Edit stream unavailable: {}",
                "⚠️".yellow(),
                e.to_string().yellow()
            );
            None
        }
    }
}

fn print_step(index: usize, step: &Step, output: &StepOutput) {
    let label = format!("[{index}] {}", step.name());
    match output {
        StepOutput::Done => println!("  {} {}", "✓".green(), label),
        StepOutput::Placed(Some(path)) => {
            println!("  {} {} → {}", "✓".green(), label, path.to_string().cyan())
        }
        StepOutput::Placed(None) => println!("  {} {} → {}", "✓".green(), label, "detached".dimmed()),
        StepOutput::Matches(paths) => {
            let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
            println!(
                "  {} {} → {} visible: {}",
                "✓".green(),
                label,
                paths.len(),
                paths.join(" ").cyan()
            );
        }
    }
}

fn print_outcome(index: usize, outcome: &PollOutcome) {
    let label = format!("[{index}] poll");
    match &outcome.blocked {
        None => println!(
            "  {} {} → applied {}, {} remaining",
            "✓".green(),
            label,
            outcome.applied,
            outcome.remaining
        ),
        Some(error) => println!(
            "  {} {} → applied {}, blocked: {}",
            "⏸".yellow(),
            label,
            outcome.applied,
            error.to_string().yellow()
        ),
    }
}

fn print_summary(doc: &mut PatchedDocument<Document>) {
    let reconciler = doc.reconciler();
    let phase = match reconciler.phase() {
        Phase::Done => "done".green().bold(),
        Phase::Draining => "draining".yellow().bold(),
        Phase::Idle => "idle".dimmed(),
    };
    println!();
    println!(
        "Phase: {}  applied: {}  pending: {}  last seen: {}",
        phase,
        reconciler.applied_count(),
        reconciler.pending_len(),
        reconciler.last_seen()
    );

    let violations = doc.take_violations();
    if violations.is_empty() {
        println!("{} No protocol violations", "✅".green());
    } else {
        println!(
            "{} {} protocol violation(s)",
            "⚠️".yellow(),
            violations.len()
        );
        for violation in violations {
            println!("  {} {}", "✗".red(), violation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn apply_args(edits: PathBuf) -> ApplyArgs {
        ApplyArgs {
            edits,
            snapshot: None,
            script: None,
            html: true,
            json: false,
            no_violations: false,
        }
    }

    #[tokio::test]
    async fn test_apply_with_script() {
        let dir = tempfile::tempdir().unwrap();
        let edits = write(
            dir.path(),
            "edits.json",
            r#"{"edits": [{"cpid": [0], "i": 1, "n": "li", "attrs": {"id": "remote"}}]}"#,
        );
        let snapshot = write(
            dir.path(),
            "snapshot.json",
            r#"[{"tag": "ul", "children": [
                {"tag": "li", "attrs": {"id": "a"}},
                {"tag": "li", "attrs": {"id": "b"}}
            ]}]"#,
        );
        let script = write(
            dir.path(),
            "script.json",
            r#"{"steps": [
                {"op": "insertBefore", "parent": [0], "reference": [0, 0],
                 "node": {"tag": "li", "attrs": {"id": "local"}}},
                {"op": "poll"}
            ]}"#,
        );

        let args = ApplyArgs {
            snapshot: Some(snapshot),
            script: Some(script),
            ..apply_args(edits)
        };
        let doc = reconcile(&args, PatcherConfig::default()).await.unwrap();
        assert_eq!(doc.phase(), Phase::Done);
        assert_eq!(
            doc.inner().to_html(),
            r#"<ul><li id="local"></li><li id="a"></li><li id="remote"></li><li id="b"></li></ul>"#
        );

        apply(args, &dir.path().display().to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_survives_missing_stream() {
        let dir = tempfile::tempdir().unwrap();
        let args = ApplyArgs {
            json: true,
            html: false,
            no_violations: true,
            ..apply_args(dir.path().join("missing.json"))
        };

        let mut doc = reconcile(&args, PatcherConfig::default()).await.unwrap();
        assert_eq!(doc.phase(), Phase::Draining);
        assert!(doc.is_intercepting());
        assert_eq!(doc.inner().to_html(), "");
        assert!(doc.take_violations().is_empty());

        apply(args, &dir.path().display().to_string()).await.unwrap();
    }

    #[tokio::test]
    async fn test_apply_reports_bad_script_step() {
        let dir = tempfile::tempdir().unwrap();
        let edits = write(dir.path(), "edits.json", r#"{"edits": []}"#);
        let script = write(
            dir.path(),
            "script.json",
            r#"{"steps": [{"op": "remove", "path": [4]}]}"#,
        );
        let args = ApplyArgs {
            script: Some(script),
            ..apply_args(edits)
        };
        let error = apply(args, &dir.path().display().to_string())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("Step 0 (remove) failed"));
    }
}
