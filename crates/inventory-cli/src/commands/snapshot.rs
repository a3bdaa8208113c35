//! Snapshot commands: submit, reconcile, show, list

use std::path::PathBuf;

use clap::{Args, Subcommand};
use inventory_core::{CancelToken, DiscoverySnapshot, ReconcileOutcome};
use inventory_engine::commands::snapshot::PendingReconcile;
use inventory_engine::{
    apply_engine_command, apply_engine_query, EngineCommand, EngineCommandResult, EngineQuery,
    EngineQueryResult,
};
use inventory_store::SqliteStore;

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Store a discovery payload (a JSON array of device descriptors)
    Submit(SubmitArgs),
    /// Reconcile one snapshot, or every snapshot not yet completed
    Reconcile(ReconcileArgs),
    /// Print one snapshot as JSON
    Show(ShowArgs),
    /// List snapshots with their phase
    List,
}

#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Path to the JSON payload
    pub file: PathBuf,

    /// Snapshot name; defaults to the file name without extension
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Snapshot uid
    #[arg(required_unless_present = "pending", conflicts_with = "pending")]
    pub uid: Option<String>,

    #[arg(long)]
    pub pending: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub uid: String,
}

pub fn execute(
    args: SnapshotArgs,
    store: &SqliteStore,
    cancel: &CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    match args.command {
        SnapshotCommand::Submit(submit_args) => execute_submit(submit_args, store, cancel),
        SnapshotCommand::Reconcile(reconcile_args) => {
            execute_reconcile(reconcile_args, store, cancel)
        }
        SnapshotCommand::Show(show_args) => execute_show(show_args, store),
        SnapshotCommand::List => execute_list(store),
    }
}

fn execute_submit(
    args: SubmitArgs,
    store: &SqliteStore,
    cancel: &CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("failed to read {}: {}", args.file.display(), e))?;
    let raw_data: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not valid JSON: {}", args.file.display(), e))?;

    let name = match args.name {
        Some(name) => name,
        None => args
            .file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or("cannot derive a snapshot name from the file path; pass --name")?,
    };

    match apply_engine_command(EngineCommand::SubmitSnapshot { name, raw_data }, store, cancel)? {
        EngineCommandResult::Submitted { uid } => {
            println!("{}", uid);
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}

fn execute_reconcile(
    args: ReconcileArgs,
    store: &SqliteStore,
    cancel: &CancelToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let cmd = match args.uid {
        Some(uid) if !args.pending => EngineCommand::ReconcileSnapshot { uid },
        _ => EngineCommand::ReconcilePending,
    };

    match apply_engine_command(cmd, store, cancel)? {
        EngineCommandResult::Reconciled(outcome) => {
            println!("{}", describe(&outcome));
            Ok(())
        }
        EngineCommandResult::ReconciledPending(entries) => report_pending(&entries),
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}

fn describe(outcome: &ReconcileOutcome) -> String {
    match outcome {
        ReconcileOutcome::AlreadyCompleted => "Snapshot already completed; nothing to do.".to_string(),
        ReconcileOutcome::Completed(summary) => {
            let mut line = summary.to_string();
            if summary.skipped_empty_serial > 0 || summary.failed > 0 {
                line.push_str(&format!(
                    " ({} skipped without serial number, {} failed)",
                    summary.skipped_empty_serial, summary.failed
                ));
            }
            line
        }
    }
}

fn report_pending(entries: &[PendingReconcile]) -> Result<(), Box<dyn std::error::Error>> {
    if entries.is_empty() {
        println!("No pending snapshots.");
        return Ok(());
    }

    let mut failed = 0;
    for entry in entries {
        match &entry.result {
            Ok(outcome) => println!("{}  {}  {}", entry.uid, entry.name, describe(outcome)),
            Err(e) => {
                failed += 1;
                println!("{}  {}  FAILED: {}", entry.uid, entry.name, e);
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} snapshots failed", failed, entries.len()).into());
    }
    Ok(())
}

fn execute_show(args: ShowArgs, store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    match apply_engine_query(EngineQuery::GetSnapshot { uid: args.uid }, store)? {
        EngineQueryResult::Snapshot(snapshot) => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}

fn execute_list(store: &SqliteStore) -> Result<(), Box<dyn std::error::Error>> {
    match apply_engine_query(EngineQuery::ListSnapshots, store)? {
        EngineQueryResult::Snapshots(snapshots) => {
            for snapshot in &snapshots {
                println!("{}", list_line(snapshot));
            }
            Ok(())
        }
        other => Err(format!("unexpected engine result: {:?}", other).into()),
    }
}

fn list_line(snapshot: &DiscoverySnapshot) -> String {
    let phase = snapshot
        .status
        .phase
        .map(|p| p.as_str())
        .unwrap_or("Pending");
    format!(
        "{}  {}  {}  {}",
        snapshot.uid(),
        snapshot.name(),
        phase,
        snapshot.status.message
    )
    .trim_end()
    .to_string()
}
