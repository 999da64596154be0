//! # roster_check
//!
//! Audits body/head content and dry-runs a stage roster against it.
//!
//! ```text
//! roster_check --roster data/roster_demo.toml --seed 7
//! RUST_LOG=debug roster_check --registry content/bodies.toml --roster stage09.toml
//! ```
//!
//! Exits non-zero when the content has errors or a record fails for a reason
//! other than the stage budget.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mannequin_bodies::{
    BodiesConfig, BodiesSystem, BodyRegistry, BodyResult, InMemoryAssets, Roster, RosterReport,
};
use mannequin_core::RandomStream;

#[derive(Parser, Debug)]
#[command(name = "roster_check")]
#[command(about = "Audit body content and dry-run a stage roster")]
struct Args {
    /// Body/head registry (bundled content if omitted)
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Budget config (defaults if omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stage roster to dry-run
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Seed for head selection and cosmetic rolls
    #[arg(short, long, default_value = "0")]
    seed: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("roster_check: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when problems were found.
fn run(args: &Args) -> BodyResult<bool> {
    let registry = Arc::new(match &args.registry {
        Some(path) => BodyRegistry::from_file(path)?,
        None => BodyRegistry::builtin()?,
    });
    let config = match &args.config {
        Some(path) => BodiesConfig::from_file(path)?,
        None => BodiesConfig::default(),
    };

    println!(
        "Registry: {} bodies, {} heads",
        registry.bodies().len(),
        registry.heads().len()
    );

    let issues = registry.audit();
    let mut ok = true;
    for issue in &issues {
        let level = if issue.is_error() { "error" } else { "warning" };
        println!("  {level}: {issue}");
        ok &= !issue.is_error();
    }
    if issues.is_empty() {
        println!("  content audit clean");
    }

    let Some(path) = &args.roster else {
        return Ok(ok);
    };
    let roster = Roster::from_file(path)?;

    let assets = InMemoryAssets::from_registry(&registry);
    let mut bodies = BodiesSystem::new(config, assets);
    bodies.init(registry);

    let mut rng = RandomStream::from_seed(args.seed);
    bodies.reset(roster.stage, &mut rng)?;

    let budget = bodies.free_capacity();
    let wanted = roster.chrs.len() + roster.eyespies.len();
    println!(
        "\n{}: {} records, {} eyespies, pool {} (seed {})",
        roster.stage,
        roster.chrs.len(),
        roster.eyespies.len(),
        budget,
        rng.seed()
    );
    if !bodies.roster_fits(wanted) {
        println!("  warning: roster needs {wanted} slots, stage has {budget}");
    }

    let report = bodies.load_roster(roster.stage, &roster.chrs, &mut rng);
    print_report(&bodies, &report);
    ok &= report.content_errors().next().is_none();

    for eyespy in &roster.eyespies {
        match bodies.allocate_eyespy(eyespy.pad(), eyespy.room, &mut rng) {
            Ok(prop) => println!(
                "  eyespy {} {} at ({:.1}, {:.1}, {:.1})",
                prop.pad, prop.room, prop.position.x, prop.position.y, prop.position.z
            ),
            Err(e) => {
                println!("  eyespy {} FAILED: {e}", eyespy.pad);
                ok = false;
            }
        }
    }

    println!("  free after load: {}", bodies.free_capacity());
    Ok(ok)
}

fn print_report(bodies: &BodiesSystem<InMemoryAssets>, report: &RosterReport) {
    for (index, handle) in &report.spawned {
        let (Some(chr), Some(model)) = (bodies.chr(*index), bodies.model(*handle)) else {
            continue;
        };
        let head = chr
            .head
            .map_or_else(|| "integrated".to_string(), |h| h.to_string());
        println!(
            "  #{index:<3} chr {:<3} {} + {head}  height x{:.3}{}",
            chr.chr_num,
            chr.body,
            model.height_factor,
            if model.eyewear { "  eyewear" } else { "" }
        );
    }
    for (index, error) in &report.failures {
        println!("  #{index:<3} FAILED: {error}");
    }
}
