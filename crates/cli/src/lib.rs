use anyhow::{Context, Result};
use calography_graph::{io as shower_io, GraphError, RecorderConfig, ShowerNode};
use clap::{Args, Parser, Subcommand};
use flags::OrderingFlag;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

mod flags;
pub mod replay;
pub mod report;
pub mod viz;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "calography")]
#[command(about = "Inspect and build particle shower graphs", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one event as a Graphviz digraph
    Viz(VizArgs),

    /// Print the indented tree of one or every event
    Print(PrintArgs),

    /// Summarise every event of a collection
    Stats(StatsArgs),

    /// Show a node and its provenance
    Find(FindArgs),

    /// Rebuild shower graphs from a JSON Lines driver recording
    Replay(ReplayArgs),
}

#[derive(Args)]
struct VizArgs {
    /// Collection file
    file: PathBuf,

    /// Event index within the collection
    event: usize,

    /// Output path (default: <file>.gv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write DOT to stdout instead of a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
}

#[derive(Args)]
struct PrintArgs {
    /// Collection file
    file: PathBuf,

    /// Only this event
    #[arg(long)]
    event: Option<usize>,
}

#[derive(Args)]
struct StatsArgs {
    /// Collection file
    file: PathBuf,

    /// Output JSON instead of a markdown table
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FindArgs {
    /// Collection file
    file: PathBuf,

    /// Event index within the collection
    #[arg(long)]
    event: usize,

    /// Node id to look up
    #[arg(long)]
    id: u64,
}

#[derive(Args)]
struct ReplayArgs {
    /// JSON Lines file of driver messages
    input: PathBuf,

    /// Run number appended to the output base name
    #[arg(long, default_value_t = 0)]
    run: u32,

    /// Recorder configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the output base name
    #[arg(long)]
    base_name: Option<String>,

    /// Override how steps are matched to open tracks
    #[arg(long, value_enum)]
    ordering: Option<OrderingFlag>,

    /// Override the primary track id
    #[arg(long)]
    primary_track_id: Option<u32>,
}

/// Arguments of the standalone `cgviz` tool.
#[derive(Parser)]
#[command(name = "cgviz")]
#[command(about = "Write one shower event as <file>.gv", long_about = None)]
#[command(version)]
struct CgvizCli {
    /// Collection file
    file: PathBuf,

    /// Event index within the collection
    event: usize,
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Viz(args) => run_viz(args),
        Commands::Print(args) => run_print(args),
        Commands::Stats(args) => run_stats(args),
        Commands::Find(args) => run_find(args),
        Commands::Replay(args) => run_replay(args),
    }
}

pub fn cgviz_entry() -> Result<()> {
    let cli = CgvizCli::parse();
    init_logging(false, false);

    run_viz(VizArgs {
        file: cli.file,
        event: cli.event,
        output: None,
        stdout: false,
    })
}

fn load(file: &Path) -> Result<Vec<ShowerNode>> {
    shower_io::read_collection(file)
        .with_context(|| format!("Failed to read collection {}", file.display()))
}

fn select_event(trees: &[ShowerNode], index: usize) -> Result<&ShowerNode> {
    trees.get(index).ok_or_else(|| {
        GraphError::Lookup {
            index,
            len: trees.len(),
        }
        .into()
    })
}

fn default_viz_path(file: &Path) -> PathBuf {
    let mut name = OsString::from(file.as_os_str());
    name.push(".gv");
    PathBuf::from(name)
}

fn run_viz(args: VizArgs) -> Result<()> {
    let trees = load(&args.file)?;
    let tree = select_event(&trees, args.event)?;
    let dot = viz::render_dot(tree);

    if args.stdout {
        return print_stdout(dot.trim_end());
    }

    let output = args.output.unwrap_or_else(|| default_viz_path(&args.file));
    std::fs::write(&output, dot)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    log::info!(
        "Event {} ({} nodes) written to {}",
        args.event,
        tree.node_count(),
        output.display()
    );
    print_stdout(&output.display().to_string())
}

fn run_print(args: PrintArgs) -> Result<()> {
    let trees = load(&args.file)?;
    match args.event {
        Some(index) => print_stdout(select_event(&trees, index)?.dump().trim_end()),
        None => {
            let mut out = String::new();
            for (index, tree) in trees.iter().enumerate() {
                out.push_str(&format!("# event {index}\n"));
                out.push_str(&tree.dump());
            }
            print_stdout(out.trim_end())
        }
    }
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let trees = load(&args.file)?;
    let stats = report::collect_stats(&trees);
    if args.json {
        print_stdout(&serde_json::to_string_pretty(&stats)?)
    } else {
        print_stdout(report::render_stats_report(&args.file, &stats).trim_end())
    }
}

fn run_find(args: FindArgs) -> Result<()> {
    let trees = load(&args.file)?;
    let tree = select_event(&trees, args.event)?;
    let node = tree
        .find(args.id)
        .with_context(|| format!("Node {} not found in event {}", args.id, args.event))?;
    let ancestors = tree.provenance_of(args.id).unwrap_or_default();
    print_stdout(report::render_provenance(node, &ancestors).trim_end())
}

fn run_replay(args: ReplayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RecorderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RecorderConfig::default(),
    };
    if let Some(base_name) = args.base_name {
        config.base_name = base_name;
    }
    if let Some(ordering) = args.ordering {
        config.ordering = ordering.as_domain();
    }
    if let Some(primary) = args.primary_track_id {
        config.primary_track_id = primary;
    }

    let (_, path) = replay::replay_file(&args.input, config, args.run)?;
    print_stdout(&path.display().to_string())
}
