use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use nodeflow::{
    BatchError, BatchOptions, CompileOptions, Diagnostics, EdgeId, GraphDef, GraphIndex, NodeId,
    Overrides,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "nodeflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a graph into a scene document.
    Compile(CompileArgs),
    /// Compile one scene per batch key.
    Batch(BatchArgs),
    /// Print derived index data for one node.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input graph JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override tables JSON.
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Output scene JSON (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Reject graphs with more nodes than this.
    #[arg(long, default_value_t = CompileOptions::default().max_nodes)]
    max_nodes: usize,

    /// Reject graphs producing more drawable instances than this.
    #[arg(long, default_value_t = CompileOptions::default().max_instances)]
    max_instances: usize,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Input graph JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Override tables JSON holding the batch table.
    #[arg(long)]
    overrides: PathBuf,

    /// Directory receiving `<key>.json` per variant.
    #[arg(long)]
    out_dir: PathBuf,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Reject graphs with more nodes than this.
    #[arg(long, default_value_t = CompileOptions::default().max_nodes)]
    max_nodes: usize,

    /// Reject graphs producing more drawable instances than this.
    #[arg(long, default_value_t = CompileOptions::default().max_instances)]
    max_instances: usize,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Input graph JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Node to inspect.
    #[arg(long)]
    node: String,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Batch(args) => cmd_batch(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn load_index(path: &Path) -> anyhow::Result<GraphIndex> {
    let graph = GraphDef::from_path(path)?;
    nodeflow::index(&graph).with_context(|| format!("index graph '{}'", path.display()))
}

fn load_overrides(path: Option<&Path>) -> anyhow::Result<Overrides> {
    match path {
        Some(p) => Ok(Overrides::from_path(p)?),
        None => Ok(Overrides::default()),
    }
}

fn write_json(path: Option<&Path>, value: &impl Serialize) -> anyhow::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).context("serialize JSON")?;
    bytes.push(b'\n');
    match path {
        Some(p) => {
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(p, bytes).with_context(|| format!("write '{}'", p.display()))
        }
        None => std::io::stdout()
            .write_all(&bytes)
            .context("write to stdout"),
    }
}

fn report(diags: &Diagnostics) {
    for d in &diags.entries {
        if d.is_error() {
            tracing::error!(code = %d.code, nodes = ?d.nodes, "{}", d.message);
        } else {
            tracing::warn!(code = %d.code, nodes = ?d.nodes, "{}", d.message);
        }
    }
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let index = load_index(&args.in_path)?;
    let overrides = load_overrides(args.overrides.as_deref())?;
    let options = CompileOptions {
        max_nodes: args.max_nodes,
        max_instances: args.max_instances,
    };

    match nodeflow::compile(&index, &overrides, &options) {
        Ok(c) => {
            report(&Diagnostics {
                entries: c.warnings,
            });
            write_json(args.out.as_deref(), &c.scene)?;
            if let Some(out) = &args.out {
                eprintln!("wrote {}", out.display());
            }
            Ok(())
        }
        Err(diags) => {
            report(&diags);
            write_json(None, &diags)?;
            anyhow::bail!("compilation failed with {} error(s)", diags.errors().count())
        }
    }
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let index = load_index(&args.in_path)?;
    let overrides = load_overrides(Some(&args.overrides))?;
    for key in overrides.batch.keys() {
        check_key_file_name(&key)?;
    }
    let options = CompileOptions {
        max_nodes: args.max_nodes,
        max_instances: args.max_instances,
    };
    let batch = BatchOptions {
        threads: args.threads,
    };

    let expansion = match nodeflow::expand_batch(&index, &overrides, &options, &batch) {
        Ok(e) => e,
        Err(BatchError::Compile(diags)) => {
            report(&diags);
            write_json(None, &diags)?;
            anyhow::bail!("base compilation failed with {} error(s)", diags.errors().count());
        }
        Err(e) => return Err(e.into()),
    };

    let mut failed = 0usize;
    for v in &expansion.variants {
        match &v.outcome {
            Ok(c) => {
                let out = args.out_dir.join(format!("{}.json", v.key));
                write_json(Some(&out), &c.scene)?;
                eprintln!("wrote {}", out.display());
            }
            Err(diags) => {
                failed += 1;
                tracing::error!(key = %v.key, "variant failed");
                report(diags);
                let out = args.out_dir.join(format!("{}.diagnostics.json", v.key));
                write_json(Some(&out), diags)?;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} variant(s) failed", expansion.variants.len());
    }
    Ok(())
}

fn check_key_file_name(key: &str) -> anyhow::Result<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        anyhow::bail!("batch key '{key}' cannot be used as a file name");
    }
    Ok(())
}

#[derive(Serialize)]
struct Inspection {
    node: NodeId,
    upstream_objects: Vec<NodeId>,
    visible_variables: Vec<nodeflow::VariableRef>,
    downstream: Vec<NodeId>,
    branches: Vec<Branch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_ports: Option<Vec<String>>,
    dangling_edges: Vec<nodeflow::DanglingEdge>,
}

#[derive(Serialize)]
struct Branch {
    edge: EdgeId,
    #[serde(flatten)]
    availability: nodeflow::BranchAvailability,
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let graph = GraphDef::from_path(&args.in_path)?;
    let index = nodeflow::index(&graph)?;
    let node = NodeId(args.node);

    let upstream_objects = index.upstream_objects(&node)?.into_iter().collect();
    let visible_variables = index.visible_variables(&node)?;
    let downstream = index.downstream_nodes(&node)?;

    let mut edges: Vec<&EdgeId> = graph
        .edges
        .iter()
        .filter(|e| e.source == node)
        .map(|e| &e.id)
        .collect();
    edges.sort();
    let branches = edges
        .into_iter()
        .filter_map(|edge| {
            let availability = index.branch_availability(&node, edge).ok()?;
            Some(Branch {
                edge: edge.clone(),
                availability,
            })
        })
        .collect();

    let inspection = Inspection {
        merge_ports: index
            .valid_merge_ports(&node)
            .map(|ports| ports.into_iter().map(|p| p.0).collect()),
        node,
        upstream_objects,
        visible_variables,
        downstream,
        branches,
        dangling_edges: index.dangling_edges().to_vec(),
    };
    write_json(None, &inspection)
}
