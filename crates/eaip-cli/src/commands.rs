use std::path::Path;

use anyhow::Context;
use colored::Colorize;

use eaip_diff::{compare_contents, ChangeAction, ChangeSet};
use eaip_server::{EaipServer, ServerConfig};
use eaip_store::codec;
use eaip_types::{ContentHash, DocumentContent, DocumentId};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Diff(args) => cmd_diff(args, &cli.format),
        Command::Check(args) => cmd_check(args, &cli.format),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }
    println!("eAIP history server on {}", config.bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(EaipServer::new(config).serve())?;
    Ok(())
}

fn cmd_diff(args: DiffArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let set = diff_files(&args.from, &args.to)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&set)?),
        OutputFormat::Text => print_change_set(&set),
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let content = load_content(&args.file)?;
    let hash = check_content(&content)
        .with_context(|| format!("{} does not encode losslessly", args.file.display()))?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "file": args.file.display().to_string(),
                "content_hash": hash.to_hex(),
                "sections": content.sections.len(),
                "subsections": content.subsection_count(),
            })
        ),
        OutputFormat::Text => {
            println!("{} {} encodes losslessly", "✓".green().bold(), args.file.display());
            println!("  Content hash: {}", hash.to_hex().cyan());
            println!(
                "  Sections: {}, subsections: {}",
                content.sections.len(),
                content.subsection_count()
            );
        }
    }
    Ok(())
}

fn load_content(path: &Path) -> anyhow::Result<DocumentContent> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let content: DocumentContent =
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))?;
    content
        .check_ids()
        .with_context(|| format!("checking {}", path.display()))?;
    Ok(content)
}

fn diff_files(from: &Path, to: &Path) -> anyhow::Result<ChangeSet> {
    let old = load_content(from)?;
    let new = load_content(to)?;
    Ok(compare_contents(DocumentId::new(), &old, &new))
}

/// Encode with the snapshot codec and return the content hash a snapshot of
/// this content would carry.
fn check_content(content: &DocumentContent) -> anyhow::Result<ContentHash> {
    let payload = codec::encode_verified(content)?;
    Ok(codec::content_hash(&payload))
}

fn print_change_set(set: &ChangeSet) {
    if set.is_empty() {
        println!("No changes.");
        return;
    }
    for change in &set.changes {
        let marker = match change.action {
            ChangeAction::Added => "+".green().bold(),
            ChangeAction::Removed => "-".red().bold(),
            ChangeAction::Modified => "~".yellow().bold(),
        };
        println!(
            "{} {:<10} {}  {}",
            marker,
            change.change_type.as_str(),
            change.path.cyan(),
            change.description
        );
    }
    let s = &set.summary;
    println!(
        "\n{} changes: sections +{} -{} ~{}, subsections +{} -{} ~{}, content ~{}, metadata ~{}",
        s.total().to_string().bold(),
        s.sections_added,
        s.sections_removed,
        s.sections_modified,
        s.subsections_added,
        s.subsections_removed,
        s.subsections_modified,
        s.content_modified,
        s.metadata_modified,
    );
}
