//! # psystem demo binary
//!
//! Assembles a small, hard-coded P-system and runs it to completion,
//! writing the trace file and output CSV to the paths given on the
//! command line. Parsing a scene-file format is out of scope; this
//! exists only to exercise the library end-to-end.

use clap::Parser;

use psystem::config::PSystemConfig;
use psystem::derivation::Semantics;
use psystem::driver::OutputSpec;
use psystem::membrane::MembraneArena;
use psystem::multiset::Multiset;
use psystem::observers::{CsvOutputSink, FileTraceSink};
use psystem::rng::{SimRng, StdSimRng};
use psystem::rule::{MoveCode, Rule, RuleKind, RuleRight};
use psystem::rules_table::RuleTable;
use psystem::symbol::{Alphabet, Symbol};
use psystem::system::System;

#[derive(Parser, Debug)]
#[command(name = "psystem", about = "Run a demonstration P-system to a fixed point")]
struct Cli {
    /// Path the run trace is written to.
    #[arg(long, default_value = "trace.txt")]
    trace: String,

    /// Path the observed-symbol-counts CSV is written to.
    #[arg(long, default_value = "output.csv")]
    output: String,

    /// Configuration file to load (falls back to built-in defaults plus
    /// `PSYSTEM_*` environment variables if absent).
    #[arg(long)]
    config: Option<String>,
}

fn build_demo_system(semantics: Semantics) -> System {
    let a = Symbol::new("a");
    let b = Symbol::new("b");
    let c = Symbol::new("c");

    let mut arena = MembraneArena::new();
    let skin = arena.insert_root("skin".into(), None, 1, Multiset::new());
    let inner = arena.insert_child(skin, "m1".into(), None, 1, Multiset::from_pairs([(a.clone(), 6)])).expect("fresh arena");

    let mut rules = RuleTable::new();
    rules.register(
        "m1",
        RuleKind::ObjectRule,
        Rule::new(
            Some("split".into()),
            Multiset::from_pairs([(a.clone(), 2)]),
            RuleRight::Simple(Multiset::from_pairs([(b.clone(), 1)])),
            MoveCode::Here,
            1.0,
            None,
            None,
            None,
        )
        .expect("valid rule"),
    );
    rules.register(
        "m1",
        RuleKind::ObjectRule,
        Rule::new(
            Some("emit".into()),
            Multiset::from_pairs([(b.clone(), 1)]),
            RuleRight::Simple(Multiset::from_pairs([(c.clone(), 1)])),
            MoveCode::Out,
            1.0,
            None,
            None,
            None,
        )
        .expect("valid rule"),
    );

    let alphabet = Alphabet::new(vec![a, b, c.clone()]);
    let output = OutputSpec { membrane: skin, symbols: vec![c] };
    System::new(alphabet, arena, skin, rules, output, semantics)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PSystemConfig::from_file(path)?,
        None => PSystemConfig::load().unwrap_or_default(),
    };

    let mut system = build_demo_system(config.semantics);
    let mut rng: Box<dyn SimRng> = match config.seed {
        Some(seed) => Box::new(StdSimRng::seeded(seed)),
        None => Box::new(StdSimRng::from_entropy()),
    };
    let mut trace = FileTraceSink::create(&cli.trace)?;
    let mut output = CsvOutputSink::create(&cli.output)?;

    let report = system.run(config.max_steps, rng.as_mut(), &mut trace, &mut output)?;
    tracing::info!(
        steps = report.steps_taken,
        stop_reason = ?report.stop_reason,
        firings = report.total_firings_applied,
        "simulation finished"
    );

    Ok(())
}
