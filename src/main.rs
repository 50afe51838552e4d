use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use eframe::egui::{Vec2, pos2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use idea_atlas::AtlasConfig;
use idea_atlas::atlas::{Dataset, EmbeddingMap, LayoutInput, read_json};
use idea_atlas::layout::project::{PrecomputedProjection, PrincipalAxes, Projector};
use idea_atlas::layout::run_layout;
use idea_atlas::runtime::dive::{DiveState, DiveSwitch};
use idea_atlas::runtime::proximity::ProximityManager;
use idea_atlas::runtime::{Session, SessionInput, build_index};
use idea_atlas::util::{round2, short_label, unit_or};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file overriding default tunables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lay out extracted ideas and write the dataset directory
    Layout(LayoutArgs),
    /// Summarize a dataset directory and its spatial index
    Inspect(DataArgs),
    /// List ideas near a point or near an idea found by label
    Probe(ProbeArgs),
    /// Fly toward an idea and print one JSON line per frame
    Fly(FlyArgs),
}

#[derive(Debug, Args)]
struct DataArgs {
    /// Directory holding ideas.json, topics.json and posts.json
    #[arg(long)]
    data: PathBuf,
}

#[derive(Debug, Args)]
struct LayoutArgs {
    /// JSON file with `posts` and `ideas`
    #[arg(long)]
    input: PathBuf,
    /// JSON object mapping idea id to embedding
    #[arg(long)]
    embeddings: PathBuf,
    /// JSON object mapping idea id to a projected [x, y]
    #[arg(long)]
    projection: Option<PathBuf>,
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    seed: Option<u64>,
    /// Cosine similarity above which two ideas are duplicates
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Debug, Args)]
struct ProbeArgs {
    #[command(flatten)]
    data: DataArgs,
    #[arg(long, requires = "y", conflicts_with = "label", allow_negative_numbers = true)]
    x: Option<f32>,
    #[arg(long, requires = "x", allow_negative_numbers = true)]
    y: Option<f32>,
    #[arg(long)]
    label: Option<String>,
    #[arg(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Debug, Args)]
struct FlyArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Idea id, or a label to search for
    #[arg(long)]
    target: String,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    from_x: f32,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    from_y: f32,
    #[arg(long, default_value_t = 600)]
    frames: usize,
    /// Print every n-th frame
    #[arg(long, default_value_t = 1)]
    every: usize,
}

#[derive(Serialize)]
struct FlightFrame<'a> {
    frame: u64,
    x: f32,
    y: f32,
    speed: f32,
    zoom: f32,
    target_zoom: f32,
    viewport: [f32; 4],
    dive: DiveState,
    #[serde(skip_serializing_if = "Option::is_none")]
    switched: Option<DiveSwitch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nearest: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nearest_distance: Option<f32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let config = AtlasConfig::load_or_default(cli.config.as_deref())
        .context("failed to load config")?;

    match cli.command {
        Command::Layout(args) => layout(args, config),
        Command::Inspect(args) => inspect(&args, &config),
        Command::Probe(args) => probe(&args, &config),
        Command::Fly(args) => fly(&args, &config),
    }
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    Dataset::load(&args.data)
        .with_context(|| format!("failed to load dataset from {}", args.data.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}

fn layout(args: LayoutArgs, mut config: AtlasConfig) -> Result<()> {
    if let Some(seed) = args.seed {
        config.layout.seed = seed;
    }
    if let Some(threshold) = args.threshold {
        config.layout.dedup_threshold = threshold;
    }

    let input: LayoutInput = read_json(&args.input).context("failed to read layout input")?;
    let embeddings: EmbeddingMap =
        read_json(&args.embeddings).context("failed to read embeddings")?;
    let projector: Box<dyn Projector> = match &args.projection {
        Some(path) => {
            let positions: HashMap<String, [f32; 2]> =
                read_json(path).context("failed to read projection")?;
            Box::new(PrecomputedProjection::new(positions))
        }
        None => Box::new(PrincipalAxes),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(config.layout.seed);
    let output = run_layout(input, &embeddings, projector.as_ref(), &config.layout, &mut rng)
        .context("layout failed")?;
    output
        .dataset
        .save(&args.out)
        .with_context(|| format!("failed to write dataset to {}", args.out.display()))?;

    info!(out = %args.out.display(), "dataset written");
    print_json(&output.report)
}

fn inspect(args: &DataArgs, config: &AtlasConfig) -> Result<()> {
    let dataset = load_dataset(args)?;
    let index = build_index(&dataset.ideas, &config.index);
    let bounds = index.bounds();

    print_json(&json!({
        "ideas": dataset.len(),
        "topics": dataset
            .topics
            .iter()
            .map(|topic| json!({ "name": topic.name, "count": topic.count }))
            .collect::<Vec<_>>(),
        "posts": dataset.posts.len(),
        "danglingConnections": dataset.dangling_connections().len(),
        "farLinks": dataset
            .ideas
            .iter()
            .filter(|idea| idea.connections.far.is_some())
            .count(),
        "index": index.stats(),
        "bounds": [
            round2(bounds.min.x),
            round2(bounds.min.y),
            round2(bounds.max.x),
            round2(bounds.max.y),
        ],
    }))
}

fn resolve_idea(dataset: &Dataset, query: &str) -> Result<usize> {
    if let Some(index) = dataset.index_of(query) {
        return Ok(index);
    }
    match dataset.search(query, 1).first() {
        Some(&index) => Ok(index),
        None => bail!("no idea matches {query:?}"),
    }
}

fn probe(args: &ProbeArgs, config: &AtlasConfig) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let center = match (args.x, args.y, &args.label) {
        (Some(x), Some(y), _) => pos2(x, y),
        (_, _, Some(label)) => dataset.ideas[resolve_idea(&dataset, label)?].position(),
        _ => bail!("pass --x and --y, or --label"),
    };

    let index = build_index(&dataset.ideas, &config.index);
    let candidates = ProximityManager::new(config.proximity.clone()).query_nearby(&index, center);
    info!(found = candidates.len(), x = center.x, y = center.y, "probe");

    for candidate in candidates.iter().take(args.limit) {
        let Some(idea) = candidate.idea(&dataset) else {
            continue;
        };
        println!(
            "{:>9.2}  {:<6}  {:<24}  {}",
            candidate.distance,
            format!("{:?}", candidate.detail).to_lowercase(),
            idea.id(),
            short_label(&idea.idea.label, 48)
        );
    }
    Ok(())
}

fn fly(args: &FlyArgs, config: &AtlasConfig) -> Result<()> {
    let dataset = load_dataset(&args.data)?;
    let target = resolve_idea(&dataset, &args.target)?;
    let target_position = dataset.ideas[target].position();
    info!(target = dataset.ideas[target].id(), "flying");

    let mut session = Session::new(dataset, config);
    session.teleport(pos2(args.from_x, args.from_y));

    let every = args.every.max(1);
    for frame in 0..args.frames {
        let ship = session.ship();
        let thrust = if session.dive().is_active() {
            Vec2::ZERO
        } else {
            unit_or(target_position - ship.position, Vec2::ZERO)
        };

        let report = session.tick(&SessionInput {
            thrust,
            request_dive: true,
            ..SessionInput::default()
        });
        if frame % every != 0 && report.switched.is_none() {
            continue;
        }

        let nearest = report
            .nearest
            .and_then(|candidate| candidate.idea(session.dataset()))
            .map(|idea| idea.id());
        let viewport = report.camera.viewport;
        let line = FlightFrame {
            frame: report.tick,
            x: round2(report.ship.position.x),
            y: round2(report.ship.position.y),
            speed: round2(report.ship.speed()),
            zoom: report.camera.zoom,
            target_zoom: report.camera.target_zoom,
            viewport: [
                round2(viewport.min.x),
                round2(viewport.min.y),
                round2(viewport.max.x),
                round2(viewport.max.y),
            ],
            dive: report.dive,
            switched: report.switched,
            nearest,
            nearest_distance: report.nearest_distance.map(round2),
        };
        println!(
            "{}",
            serde_json::to_string(&line).context("failed to render frame")?
        );
    }

    let ship = session.ship();
    info!(
        remaining = ship.position.distance(target_position),
        dive = ?session.dive().state(),
        "flight finished"
    );
    Ok(())
}
