use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use treeweave_patcher::{EditStream, RemoteEdit};

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Edit stream document (`{"edits": [...]}`)
    #[arg(short, long)]
    pub edits: PathBuf,
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let json = fs::read_to_string(&args.edits)
        .with_context(|| format!("Cannot read {}", args.edits.display()))?;
    let edits = EditStream::from_json(&json)?.decode()?;

    println!(
        "{} {} edit(s) in {}",
        "🔍".bright_blue(),
        edits.len(),
        args.edits.display()
    );
    for (index, edit) in edits.iter().enumerate() {
        println!("  {:>4}  {}", index.to_string().dimmed(), describe(edit));
    }

    Ok(())
}

fn describe(edit: &RemoteEdit) -> String {
    let kind = match edit {
        RemoteEdit::Delete { .. } => edit.kind().red(),
        RemoteEdit::Insert { .. } => edit.kind().green(),
        RemoteEdit::Move { .. } => edit.kind().cyan(),
        RemoteEdit::Merge { .. } => edit.kind().yellow(),
    };
    format!("{:<6}  {}", kind.bold(), edit)
}
