//! Delver Headless Generation Harness
//!
//! Grows dungeons from a prefab catalog and validates every layout without
//! a renderer. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p delver-simtest
//!   cargo run -p delver-simtest -- --verbose --seed 7 --runs 20
//!   cargo run -p delver-simtest -- --catalog my_catalog.json --json > layout.json

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use delver_core::catalog::PrefabCatalog;
use delver_core::components::{Connector, DoorState, Transform};
use delver_core::engine::DungeonEngine;
use delver_core::generation::PlacementEngine;
use delver_logic::config::GeneratorConfig;
use delver_logic::constants::{ConnectorKind, PartKind};
use delver_logic::layout::{check_fully_sealed, validate_all, LayoutSnapshot, ValidationError};
use glam::Vec3;
use log::info;

#[derive(Debug, Parser)]
#[command(about = "Generate dungeons headlessly and validate their layouts")]
struct Args {
    /// First seed of the sweep.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Number of seeds to sweep.
    #[arg(long, default_value_t = 8)]
    runs: u32,
    /// Modules requested per batch run.
    #[arg(long, default_value_t = 40)]
    modules: u32,
    /// Frames the proximity scenario walks the viewer for.
    #[arg(long, default_value_t = 120)]
    frames: u32,
    /// Prefab catalog JSON (defaults to the built-in set).
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Generator config JSON (missing fields keep their defaults).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the first batch layout as JSON on stdout instead of the report.
    #[arg(long)]
    json: bool,
    #[arg(short, long)]
    verbose: bool,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    use simplelog::LevelFilter::{Debug, Off, Warn};
    simplelog::TermLogger::init(
        if args.verbose { Debug } else { Warn },
        simplelog::ConfigBuilder::new()
            .set_target_level(Off)
            .set_location_level(Off)
            .build(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let catalog = load_catalog(args.catalog.as_ref())?;
    let config = load_config(args.config.as_ref())?;

    if args.json {
        let mut engine = PlacementEngine::new(catalog, with_seed(&config, args.seed));
        engine.generate(args.modules)?;
        engine.seal_unoccupied_sockets()?;
        println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
        return Ok(());
    }

    println!("=== Delver Generation Harness ===\n");
    let mut results = Vec::new();

    // 1. Catalog sanity
    results.extend(validate_catalog(&catalog));

    // 2. Batch growth sweep
    results.extend(validate_batch(&catalog, &config, &args));

    // 3. Proximity growth around a walking viewer
    results.extend(validate_proximity(&catalog, &config, &args));

    // 4. Determinism
    results.extend(validate_determinism(&catalog, &config, &args));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed,
        results.len(),
        failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn load_catalog(path: Option<&PathBuf>) -> anyhow::Result<PrefabCatalog> {
    let Some(path) = path else {
        return Ok(PrefabCatalog::standard());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog = PrefabCatalog::from_json(&json)
        .with_context(|| format!("loading catalog {}", path.display()))?;
    info!("Loaded {} prefabs from {}", catalog.parts.len(), path.display());
    Ok(catalog)
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
}

fn with_seed(config: &GeneratorConfig, seed: u64) -> GeneratorConfig {
    GeneratorConfig {
        seed: Some(seed),
        ..config.clone()
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    match errors.first() {
        None => "clean".into(),
        Some(e) => format!("{} errors, first [{}] {}", errors.len(), e.category, e.message),
    }
}

fn layout_errors(layout: &LayoutSnapshot, config: &GeneratorConfig) -> Vec<ValidationError> {
    validate_all(layout, config.overlap_tolerance, config.connector_tolerance)
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &PrefabCatalog) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    results.push(match catalog.validate() {
        Ok(()) => TestResult::new(
            "catalog_valid",
            true,
            format!(
                "{} prefabs: {} rooms, {} special, {} hallways, {} alternate entrances",
                catalog.parts.len(),
                catalog.rooms.len(),
                catalog.special_rooms.len(),
                catalog.hallways.len(),
                catalog.alternate_entrances.len()
            ),
        ),
        Err(e) => TestResult::new("catalog_valid", false, e.to_string()),
    });

    let filler = catalog.connector(ConnectorKind::Filler);
    results.push(TestResult::new(
        "catalog_has_filler",
        filler.is_ok(),
        match filler {
            Ok(f) => format!("filler '{}'", f.name),
            Err(e) => e.to_string(),
        },
    ));

    results
}

// ── 2. Batch growth ─────────────────────────────────────────────────────

fn validate_batch(catalog: &PrefabCatalog, config: &GeneratorConfig, args: &Args) -> Vec<TestResult> {
    println!("--- Batch Growth ---");
    let mut results = Vec::new();
    let mut total_placed = 0;
    let mut total_abandoned = 0;

    for seed in args.seed..args.seed + args.runs as u64 {
        let config = with_seed(config, seed);
        let mut engine = PlacementEngine::new(catalog.clone(), config.clone());
        let report = match engine.generate(args.modules) {
            Ok(r) => r,
            Err(e) => {
                results.push(TestResult::new(format!("batch_seed_{seed}"), false, e.to_string()));
                continue;
            }
        };
        total_placed += report.placed;
        total_abandoned += report.abandoned;

        let grown = engine.snapshot();
        let errors = layout_errors(&grown, &config);
        results.push(TestResult::new(
            format!("batch_seed_{seed}"),
            errors.is_empty() && grown.modules.len() as u32 == report.placed,
            format!(
                "{} modules ({} rooms, {} hallways, {} dead ends), {}",
                grown.modules.len(),
                grown.count_kind(PartKind::Room),
                grown.count_kind(PartKind::Hallway),
                grown.count_kind(PartKind::DeadEnd),
                summarize(&errors)
            ),
        ));

        let sealed = engine.seal_unoccupied_sockets().map(|_| engine.snapshot());
        results.push(match sealed {
            Ok(layout) => {
                let mut errors = layout_errors(&layout, &config);
                errors.extend(check_fully_sealed(&layout));
                TestResult::new(
                    format!("sealed_seed_{seed}"),
                    errors.is_empty(),
                    format!(
                        "{} fillers, {} locked, {}",
                        layout.count_connectors(ConnectorKind::Filler),
                        layout.count_connectors(ConnectorKind::LockedDoor),
                        summarize(&errors)
                    ),
                )
            }
            Err(e) => TestResult::new(format!("sealed_seed_{seed}"), false, e.to_string()),
        });
    }

    if args.verbose {
        println!(
            "  {} modules over {} runs, {} abandoned steps",
            total_placed, args.runs, total_abandoned
        );
    }
    results
}

// ── 3. Proximity growth ─────────────────────────────────────────────────

fn validate_proximity(catalog: &PrefabCatalog, config: &GeneratorConfig, args: &Args) -> Vec<TestResult> {
    println!("--- Proximity Growth ---");
    let mut results = Vec::new();
    let config = with_seed(config, args.seed);
    let mut engine = DungeonEngine::new(catalog.clone(), config.clone());

    let initial = match engine.start() {
        Ok(r) => r,
        Err(e) => {
            results.push(TestResult::new("proximity_start", false, e.to_string()));
            return results;
        }
    };
    let start_modules = engine.placement.placed_modules().len();
    results.push(TestResult::new(
        "proximity_start",
        initial.stuck && start_modules > 1,
        format!("{} modules in {} passes", start_modules, initial.passes),
    ));

    // Walk from door to door: always head for the farthest one not yet visited.
    let mut visited: Vec<Vec3> = Vec::new();
    let mut target = None;
    let mut entered = 0;
    let mut frame_error = None;
    for _ in 0..args.frames {
        let here = engine.viewer();
        let goal = *target.get_or_insert_with(|| next_door(&engine, &visited).unwrap_or(here));
        let step = (goal - here).clamp_length_max(2.0);
        match engine.update(here + step) {
            Ok(frame) => entered += frame.doors.entered,
            Err(e) => {
                frame_error = Some(e);
                break;
            }
        }
        if engine.viewer().distance(goal) < 0.5 {
            visited.push(goal);
            target = None;
        }
    }
    if let Some(e) = frame_error {
        results.push(TestResult::new("proximity_walk", false, e.to_string()));
        return results;
    }

    let walked = engine.placement.snapshot();
    let errors = layout_errors(&walked, &config);
    results.push(TestResult::new(
        "proximity_walk",
        errors.is_empty(),
        format!(
            "{} doors entered, {} -> {} modules, {}",
            entered,
            start_modules,
            walked.modules.len(),
            summarize(&errors)
        ),
    ));

    if let Some(name) = engine.nearest_module_name(engine.viewer()) {
        info!("Viewer ended in '{}'", name);
    }

    results.push(match engine.finish() {
        Ok(sealed) => {
            let layout = engine.placement.snapshot();
            let mut errors = layout_errors(&layout, &config);
            errors.extend(check_fully_sealed(&layout));
            TestResult::new(
                "proximity_finish",
                errors.is_empty(),
                format!("{} sockets sealed, {}", sealed, summarize(&errors)),
            )
        }
        Err(e) => TestResult::new("proximity_finish", false, e.to_string()),
    });

    results
}

/// Farthest unvisited traversable door from the viewer.
fn next_door(engine: &DungeonEngine, visited: &[Vec3]) -> Option<Vec3> {
    let here = engine.viewer();
    engine
        .placement
        .world()
        .query::<(&Connector, &Transform, &DoorState)>()
        .iter()
        .filter(|(_, (c, _, _))| c.kind.is_traversable())
        .map(|(_, (_, t, _))| t.position())
        .filter(|p| visited.iter().all(|v| v.distance(*p) > 0.5))
        .max_by(|a, b| here.distance(*a).total_cmp(&here.distance(*b)))
}

// ── 4. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(catalog: &PrefabCatalog, config: &GeneratorConfig, args: &Args) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let run = || -> anyhow::Result<String> {
        let mut engine = PlacementEngine::new(catalog.clone(), with_seed(config, args.seed));
        engine.generate(args.modules)?;
        engine.seal_unoccupied_sockets()?;
        Ok(serde_json::to_string(&engine.snapshot())?)
    };

    let result = match (run(), run()) {
        (Ok(a), Ok(b)) => TestResult::new(
            "same_seed_same_layout",
            a == b,
            format!("seed {} -> {} bytes of layout", args.seed, a.len()),
        ),
        (Err(e), _) | (_, Err(e)) => TestResult::new("same_seed_same_layout", false, e.to_string()),
    };
    vec![result]
}
