//! hyperbevel CLI - batch sweep-cutter bevels
//!
//! Reads a polygon mesh as JSON, selects edges by vertex index pairs and
//! either prints the sweep analysis or writes the finished cutters together
//! with the modifiers the host needs.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use hyperbevel::{BevelSettings, Command, CutterExport, HostObject, HyperBevelConfig, Phase, Scene, Session};
use hyperbevel_analyze::{analyze, Analysis, AnalyzeOptions};
use hyperbevel_cutter::Modifier;
use hyperbevel_math::{Point3, Vec3};
use hyperbevel_mesh::{primitives, weld, EdgeId, Mesh, PolygonMesh, VertId};
use hyperbevel_select::{grow_loop, partition};

#[derive(Parser)]
#[command(name = "hyperbevel")]
#[command(about = "Sweep-cutter bevels for polygon meshes", long_about = None)]
struct Cli {
    /// TOML file with session tunables
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EdgeArgs {
    /// Input polygon mesh (.json)
    mesh: PathBuf,
    /// Edges as vertex index pairs, e.g. 4:5,5:6
    #[arg(long, value_delimiter = ',', value_parser = parse_edge, required = true)]
    edges: Vec<(usize, usize)>,
    /// Grow every edge into its loop
    #[arg(long)]
    loop_select: bool,
    /// Merge vertices by distance before analyzing
    #[arg(long)]
    weld: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the sweep analysis of an edge selection as JSON
    Analyze {
        #[command(flatten)]
        edges: EdgeArgs,
    },
    /// Build finished cutters for an edge selection
    Cut {
        #[command(flatten)]
        edges: EdgeArgs,
        /// Bevel width in mesh units
        #[arg(long)]
        width: f64,
        /// Bevel segments (default: 12)
        #[arg(long)]
        segments: Option<u32>,
        /// Single-segment chamfer
        #[arg(long)]
        chamfer: bool,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Bevel one top edge of a built-in cube
    DemoCube {
        /// Output file for the cutter JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// What `cut` and `demo-cube` write.
#[derive(Debug, Serialize)]
struct CutReport {
    host: String,
    modifiers: Vec<Modifier>,
    cutters: Vec<CutterExport>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => HyperBevelConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HyperBevelConfig::default(),
    };

    match cli.command {
        Commands::Analyze { edges } => {
            let polygon = load_mesh(&edges.mesh)?;
            let analysis = analyze_selection(&polygon, &edges, &config)?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Commands::Cut {
            edges,
            width,
            segments,
            chamfer,
            output,
        } => {
            let polygon = load_mesh(&edges.mesh)?;
            let name = edges
                .mesh
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Host")
                .to_string();
            let settings = BevelSettings {
                width,
                segments: segments.unwrap_or(BevelSettings::default().segments),
                chamfer,
                custom_profile: None,
            };
            let report = cut(&polygon, &name, &edges, settings, &config)?;
            write_json(&report, output.as_deref())?;
        }
        Commands::DemoCube { output } => {
            let report = demo_cube(&config)?;
            for cutter in &report.cutters {
                let boolean = cutter.manifest.boolean.as_ref();
                println!(
                    "{}: {} verts, {} faces, width {}, {:?}",
                    cutter.manifest.name,
                    cutter.mesh.positions.len(),
                    cutter.mesh.faces.len(),
                    cutter.manifest.width,
                    boolean.map(|b| b.operation),
                );
            }
            if let Some(path) = output {
                write_json(&report, Some(&path))?;
            }
        }
    }

    Ok(())
}

fn parse_edge(s: &str) -> std::result::Result<(usize, usize), String> {
    let (a, b) = s
        .trim()
        .split_once(':')
        .ok_or_else(|| format!("expected a:b, got {s:?}"))?;
    let index = |v: &str| v.trim().parse::<usize>().map_err(|e| format!("bad vertex index {v:?}: {e}"));
    Ok((index(a)?, index(b)?))
}

fn load_mesh(path: &Path) -> Result<PolygonMesh> {
    let json = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("{} is not a polygon mesh", path.display()))
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Edges named by index pairs, each grown into its loop with `loop_select`.
fn resolve_edges(
    mesh: &Mesh,
    ids: &[VertId],
    pairs: &[(usize, usize)],
    loop_angle: Option<f64>,
) -> Result<Vec<EdgeId>> {
    let mut edges = Vec::new();
    for &(a, b) in pairs {
        let (Some(&va), Some(&vb)) = (ids.get(a), ids.get(b)) else {
            bail!("vertex index out of range in {a}:{b} (mesh has {} vertices)", ids.len());
        };
        let Some(edge) = mesh.edge_between(va, vb) else {
            bail!("no edge between vertices {a} and {b}");
        };
        let grown = match loop_angle {
            Some(angle) => grow_loop(mesh, edge, angle),
            None => vec![edge],
        };
        for e in grown {
            if !edges.contains(&e) {
                edges.push(e);
            }
        }
    }
    Ok(edges)
}

fn analyze_selection(polygon: &PolygonMesh, args: &EdgeArgs, config: &HyperBevelConfig) -> Result<Analysis> {
    let (mesh, ids) = polygon.to_mesh()?;
    let loop_angle = args.loop_select.then_some(config.loop_angle);
    let edges = resolve_edges(&mesh, &ids, &args.edges, loop_angle)?;

    let (mesh, edges) = if args.weld {
        let welded = weld(&mesh, config.weld_threshold)?;
        let edges: Vec<EdgeId> = edges
            .iter()
            .filter_map(|&e| {
                let [a, b] = mesh.edge_verts(e);
                let (a, b) = (welded.vert_map.get(&a)?, welded.vert_map.get(&b)?);
                welded.mesh.edge_between(*a, *b)
            })
            .collect();
        (welded.mesh, edges)
    } else {
        (mesh, edges)
    };

    let sequences = partition(&mesh, &edges);
    if sequences.is_empty() {
        bail!("selection has no edges left to analyze");
    }
    Ok(analyze(&mesh, &sequences, &AnalyzeOptions::default())?)
}

fn cut(
    polygon: &PolygonMesh,
    name: &str,
    args: &EdgeArgs,
    settings: BevelSettings,
    config: &HyperBevelConfig,
) -> Result<CutReport> {
    if !(settings.width > 0.0 && settings.width.is_finite()) {
        bail!("width must be positive, got {}", settings.width);
    }
    let (mesh, ids) = polygon.to_mesh()?;
    let loop_angle = args.loop_select.then_some(config.loop_angle);
    let edges = resolve_edges(&mesh, &ids, &args.edges, loop_angle)?;

    let scene = Scene::new(HostObject::new(name, mesh));
    let mut session = Session::new(scene, config.clone(), settings);
    session.handle(Command::Begin);
    session.select_edges(&edges);
    if args.weld {
        session.handle(Command::ToggleWeld);
    }
    session.handle(Command::EnterAdjust);
    if session.phase() != Phase::Adjusting {
        bail!("could not build cutters for the selection");
    }
    session.handle(Command::Commit);
    Ok(report(session.into_scene()))
}

fn demo_cube(config: &HyperBevelConfig) -> Result<CutReport> {
    let (mesh, _) = primitives::cube(1.0).to_mesh()?;
    let scene = Scene::new(HostObject::new("Cube", mesh));
    let mut session = Session::new(scene, config.clone(), BevelSettings::default());

    session.handle(Command::Begin);
    session.handle(Command::PickEdge {
        origin: Point3::new(0.1, -0.9, 5.0),
        dir: -Vec3::z(),
    });
    session.handle(Command::BeginDrag);
    session.handle(Command::EnterAdjust);
    if session.phase() != Phase::Adjusting {
        bail!("demo edge could not be beveled");
    }
    session.handle(Command::Commit);
    Ok(report(session.into_scene()))
}

fn report(scene: Scene) -> CutReport {
    CutReport {
        host: scene.host.name.clone(),
        modifiers: scene.host.modifiers.iter().cloned().collect(),
        cutters: scene.cutters.iter().map(|c| c.export()).collect(),
    }
}
