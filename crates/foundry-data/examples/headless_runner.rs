//! Headless runner: load a scenario directory and step it without a view.
//!
//! Prints a progress line every simulated second and a summary at the end.
//! Set `RUST_LOG=sim=debug` (or `trace`) to see engine logging.
//!
//! Run with: `cargo run -p foundry-data --example headless_runner -- [DIR] [STEPS]`

use foundry_core::event::EventKind;
use foundry_core::fixed::Fixed64;
use foundry_data::load_simulation;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Steps per simulated second.
const STEPS_PER_SECOND: u32 = 4;

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/line")
    });
    let steps: u32 = match args.next().map(|s| s.parse()) {
        None => 240,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("invalid step count: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut sim = match load_simulation(&dir) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("failed to load {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    };

    println!(
        "=== {} buildings, balance {} ===\n",
        sim.building_count(),
        sim.balance()
    );

    let dt = Fixed64::ONE / Fixed64::from_num(STEPS_PER_SECOND);
    for step in 1..=steps {
        sim.step(dt);
        if step % STEPS_PER_SECOND == 0 {
            println!(
                "t={:>6.2}s  items={:>3}  balance={:>5}  hash={:016x}",
                sim.elapsed().to_num::<f64>(),
                sim.item_count(),
                sim.balance(),
                sim.state_hash()
            );
        }
    }

    let sold = sim.event_bus.buffer(EventKind::ItemSold).total_written();
    let ledger = sim.ledger();
    println!("\n=== Summary ===");
    println!("  ticks:          {}", sim.tick());
    println!("  items sold:     {sold}");
    println!("  total spent:    {}", ledger.total_spent());
    println!("  total credited: {}", ledger.total_credited());
    println!("  final balance:  {}", ledger.balance());
    ExitCode::SUCCESS
}
