use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pagemap_core::{Mutation, NodeId, TreeDocument, TreeModel};
use pagemap_editor::EditorSession;
use pagemap_graph::{
    DisplayMode, LayoutOptions, LayoutResult, LayoutSettings, OrphanMode, OrphanStyle,
    StackExpansion, TreeLayouter,
};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pagemap", author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay out a tree document and print the result as JSON
    Layout {
        /// Tree document (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Layout settings file; missing fields keep their defaults
        #[arg(short, long)]
        settings: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Compact)]
        mode: ModeArg,

        /// Parent whose stacked children should be shown in full (repeatable)
        #[arg(long)]
        expand: Vec<String>,

        #[arg(long, value_enum, default_value_t = OrphanModeArg::AfterTree)]
        orphan_mode: OrphanModeArg,

        #[arg(long, value_enum, default_value_t = OrphanStyleArg::Root)]
        orphan_style: OrphanStyleArg,

        /// Draw only the head box of each orphan
        #[arg(long)]
        hide_orphan_children: bool,

        #[arg(long)]
        pretty: bool,
    },
    /// Apply a JSON list of edits to a tree document
    Edit {
        #[arg(short, long)]
        input: PathBuf,

        /// JSON array of operations, e.g. [{"op": "delete", "id": "blog"}]
        #[arg(short, long)]
        script: PathBuf,

        /// Where to write the result; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
    /// Check a tree document and print its counts
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Compact,
    Thumbnail,
}

impl From<ModeArg> for DisplayMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Compact => DisplayMode::Compact,
            ModeArg::Thumbnail => DisplayMode::Thumbnail,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrphanModeArg {
    AfterRoot,
    AfterTree,
}

impl From<OrphanModeArg> for OrphanMode {
    fn from(mode: OrphanModeArg) -> Self {
        match mode {
            OrphanModeArg::AfterRoot => OrphanMode::AfterRoot,
            OrphanModeArg::AfterTree => OrphanMode::AfterTree,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OrphanStyleArg {
    Root,
    Level1,
    Subdomain,
}

impl From<OrphanStyleArg> for OrphanStyle {
    fn from(style: OrphanStyleArg) -> Self {
        match style {
            OrphanStyleArg::Root => OrphanStyle::Root,
            OrphanStyleArg::Level1 => OrphanStyle::Level1,
            OrphanStyleArg::Subdomain => OrphanStyle::Subdomain,
        }
    }
}

/// Outcome counts of an edit script.
#[derive(Debug, Default, PartialEq, Eq)]
struct EditReport {
    applied: usize,
    unchanged: usize,
    rejected: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ValidationReport {
    nodes: usize,
    orphans: usize,
    subdomains: usize,
    edges: usize,
    dangling_edges: usize,
    max_depth: usize,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    match args.command {
        Command::Layout {
            input,
            settings,
            mode,
            expand,
            orphan_mode,
            orphan_style,
            hide_orphan_children,
            pretty,
        } => {
            let model = load_document(&input)?;
            let settings = match settings {
                Some(path) => LayoutSettings::load(path)?,
                None => LayoutSettings::default(),
            };
            let options = LayoutOptions {
                orphan_mode: orphan_mode.into(),
                orphan_style: orphan_style.into(),
                render_orphan_children: !hide_orphan_children,
            };
            let expanded: StackExpansion = expand.into_iter().map(NodeId).collect();
            let result = run_layout(&model, settings, options, mode.into(), &expanded);
            tracing::info!(
                "Laid out {} of {} pages",
                result.positions.len(),
                model.node_count()
            );
            write_json(None, &result, pretty)?;
        }
        Command::Edit {
            input,
            script,
            output,
            pretty,
        } => {
            let model = load_document(&input)?;
            let script = load_script(&script)?;
            let (model, report) = run_edit(model, &script);
            tracing::info!(
                "{} applied, {} unchanged, {} rejected",
                report.applied,
                report.unchanged,
                report.rejected
            );
            write_json(output.as_deref(), &TreeDocument::from(model), pretty)?;
        }
        Command::Validate { input } => {
            let model = load_document(&input)?;
            let report = run_validate(&model);
            write_json(None, &report, true)?;
        }
    }

    Ok(())
}

fn load_document(path: &Path) -> Result<TreeModel> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading tree document {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing tree document {}", path.display()))
}

fn load_script(path: &Path) -> Result<Vec<Mutation>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading edit script {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("parsing edit script {}", path.display()))
}

fn run_layout(
    model: &TreeModel,
    settings: LayoutSettings,
    options: LayoutOptions,
    mode: DisplayMode,
    expanded: &StackExpansion,
) -> LayoutResult {
    TreeLayouter::new(settings, options).execute(model, mode, expanded)
}

fn run_edit(model: TreeModel, script: &[Mutation]) -> (TreeModel, EditReport) {
    let mut session = EditorSession::new(model);
    let mut report = EditReport::default();
    for (step, mutation) in script.iter().enumerate() {
        match session.apply(mutation) {
            Ok(true) => report.applied += 1,
            Ok(false) => report.unchanged += 1,
            Err(err) => {
                tracing::warn!("Step {} ({}) rejected: {}", step + 1, mutation.label(), err);
                report.rejected += 1;
            }
        }
    }
    (session.into_model(), report)
}

fn run_validate(model: &TreeModel) -> ValidationReport {
    let max_depth = model
        .tops()
        .flat_map(|(_, top)| top.descendants())
        .map(|(_, depth)| depth)
        .max()
        .unwrap_or(0);
    ValidationReport {
        nodes: model.node_count(),
        orphans: model.orphans().len(),
        subdomains: model
            .orphans()
            .iter()
            .filter(|o| o.kind == pagemap_core::OrphanKind::Subdomain)
            .count(),
        edges: model.edges().len(),
        dangling_edges: model.edges().len() - model.renderable_edges().len(),
        max_depth,
    }
}

fn write_json<T: Serialize>(output: Option<&Path>, value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => std::fs::write(path, text + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}")?;
        }
    }
    Ok(())
}
