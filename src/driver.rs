//! # Simulation driver
//!
//! Runs a system to a fixed point (or `max_steps`):
//!
//! ```text
//! counter := 0
//! while applied_last_step and (max_steps is None or counter < max_steps):
//!   counter += 1
//!   derive_step(root)
//!   applied_last_step := apply_queue()
//!   observe(root, counter)
//! ```
//!
//! Initial observation happens at `counter = 0`, before any step runs.

use crate::derivation::{derive_step, DerivedFiring, Semantics};
use crate::error::{PSystemError, StructuralError};
use crate::membrane::{ApplyOutcome, MembraneArena, MembraneId};
use crate::observers::{OutputSink, TraceSink};
use crate::rng::SimRng;
use crate::rules_table::RuleTable;
use crate::symbol::Symbol;

/// Why the driver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A step produced no applied firings.
    FixedPoint,
    /// `max_steps` was reached with the system still changing.
    StepCap,
}

/// Summary of a finished run, returned instead of printed — printing is
/// a UI concern left to the collaborator binary.
#[derive(Debug, Clone, Copy)]
pub struct SimulationReport {
    pub steps_taken: u64,
    pub stop_reason: StopReason,
    pub total_firings_applied: u64,
}

/// What to sample from the output membrane after each step.
pub struct OutputSpec {
    pub membrane: MembraneId,
    pub symbols: Vec<Symbol>,
}

/// Drive `root` to a fixed point under `semantics`, recording a trace
/// line per applied/skipped firing and a CSV row per observed symbol
/// per step.
#[allow(clippy::too_many_arguments)]
pub fn run(
    arena: &mut MembraneArena,
    rules: &RuleTable,
    root: MembraneId,
    semantics: Semantics,
    max_steps: Option<u64>,
    rng: &mut dyn SimRng,
    trace: &mut dyn TraceSink,
    output: &mut dyn OutputSink,
    output_spec: &OutputSpec,
) -> Result<SimulationReport, PSystemError> {
    observe(arena, output, output_spec, 0)?;

    let mut counter: u64 = 0;
    let mut applied_last_step = true;
    let mut total_firings_applied: u64 = 0;
    let stop_reason;

    loop {
        if !applied_last_step {
            stop_reason = StopReason::FixedPoint;
            break;
        }
        if let Some(cap) = max_steps {
            if counter >= cap {
                stop_reason = StopReason::StepCap;
                break;
            }
        }
        counter += 1;

        let firings = derive_step(arena, rules, root, semantics, rng)?;
        trace.begin_step(counter)?;
        let applied_this_step = apply_queue(arena, root, &firings, trace, rng)?;
        total_firings_applied += applied_this_step;
        applied_last_step = applied_this_step > 0;

        trace.flush()?;
        observe(arena, output, output_spec, counter)?;
    }

    output.flush()?;
    trace.flush()?;

    Ok(SimulationReport { steps_taken: counter, stop_reason, total_firings_applied })
}

/// Apply queued firings in FIFO order, re-validating each at apply
/// time (best-effort sequential policy). Returns the count of firings
/// that actually mutated the tree (`Applied` or `DiscardedAtRoot`).
fn apply_queue(
    arena: &mut MembraneArena,
    root: MembraneId,
    firings: &[DerivedFiring],
    trace: &mut dyn TraceSink,
    rng: &mut dyn SimRng,
) -> Result<u64, PSystemError> {
    let mut applied = 0u64;
    for firing in firings {
        let outcome = apply_one(arena, root, firing, rng)?;
        match outcome {
            ApplyOutcome::Applied | ApplyOutcome::DiscardedAtRoot => {
                applied += 1;
                trace.applied(firing.rule.move_code(), &membrane_label(arena, firing.membrane), firing.multiplicity, &firing.rule)?;
            }
            ApplyOutcome::NotApplicable => {
                trace.not_applied(firing.rule.move_code(), &membrane_label(arena, firing.membrane), firing.multiplicity, &firing.rule)?;
            }
        }
    }
    Ok(applied)
}

fn membrane_label(arena: &MembraneArena, id: MembraneId) -> String {
    arena.get(id).map(|n| n.id.clone()).unwrap_or_else(|_| "?".to_string())
}

fn apply_one(arena: &mut MembraneArena, root: MembraneId, firing: &DerivedFiring, rng: &mut dyn SimRng) -> Result<ApplyOutcome, PSystemError> {
    use crate::rule::MoveCode;

    match firing.rule.move_code() {
        MoveCode::Here => arena.apply_here(firing.membrane, &firing.rule, firing.multiplicity),
        MoveCode::Out => arena.apply_out(firing.membrane, &firing.rule, firing.multiplicity),
        MoveCode::In => {
            let dest = resolve_destination(arena, firing.membrane, firing)?;
            match dest {
                Some(dest) => arena.apply_in(firing.membrane, dest, &firing.rule, firing.multiplicity),
                None => Ok(ApplyOutcome::NotApplicable),
            }
        }
        MoveCode::MemWithObjects => {
            let Some(child_index) = firing.matched_child_index else {
                return Ok(ApplyOutcome::NotApplicable);
            };
            let dest = resolve_destination(arena, root, firing)?.ok_or(StructuralError::DestinationMembraneMissing)?;
            arena.apply_move_mem(firing.membrane, dest, child_index, &firing.rule)
        }
        MoveCode::DissolveKeep => arena.apply_dissolve_to_parent(firing.membrane, &firing.rule),
        MoveCode::Dmem => arena.apply_dmem(firing.membrane, &firing.rule, firing.multiplicity, rng),
        // Rule::new rejects every other move code; unreachable in practice.
        other => {
            let _ = other;
            Ok(ApplyOutcome::NotApplicable)
        }
    }
}

/// Resolve a rule's `destination` (a child id) against `scope`'s
/// *current* children, since an earlier firing in the same step may
/// have reshaped the tree. `IN` resolves against the firing membrane
/// itself; `MEMwOB` resolves against the tree root, since a membrane
/// carried by `MEMwOB` is re-parented among the root's own children.
fn resolve_destination(arena: &MembraneArena, scope: MembraneId, firing: &DerivedFiring) -> Result<Option<MembraneId>, PSystemError> {
    match firing.rule.destination() {
        Some(name) => arena.resolve_child_by_name(scope, name),
        None => Ok(None),
    }
}

fn observe(arena: &MembraneArena, output: &mut dyn OutputSink, spec: &OutputSpec, step: u64) -> Result<(), PSystemError> {
    let node = arena.get(spec.membrane)?;
    for symbol in &spec.symbols {
        output.record(step, symbol, node.objects.count(symbol))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;
    use crate::observers::{MemoryOutputSink, MemoryTraceSink};
    use crate::rng::StdSimRng;
    use crate::rule::{MoveCode, Rule, RuleKind, RuleRight};
    use crate::rules_table::RuleTable;

    fn m(pairs: &[(&str, u32)]) -> Multiset {
        Multiset::from_pairs(pairs.iter().map(|(s, n)| (Symbol::new(*s), *n)))
    }

    #[test]
    fn run_reaches_fixed_point_when_objects_are_exhausted() {
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("skin".into(), None, 1, m(&[("a", 1)]));
        let mut rules = RuleTable::new();
        rules.register(
            "skin",
            RuleKind::ObjectRule,
            Rule::new(Some("r1".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("b", 1)])), MoveCode::Here, 1.0, None, None, None).unwrap(),
        );
        let mut rng = StdSimRng::seeded(0);
        let mut trace = MemoryTraceSink::default();
        let mut output = MemoryOutputSink::default();
        let spec = OutputSpec { membrane: root, symbols: vec![Symbol::new("a"), Symbol::new("b")] };

        let report = run(&mut arena, &rules, root, Semantics::MinParallel, Some(10), &mut rng, &mut trace, &mut output, &spec).unwrap();

        assert_eq!(report.stop_reason, StopReason::FixedPoint);
        assert_eq!(report.steps_taken, 1);
        assert_eq!(report.total_firings_applied, 1);
        assert_eq!(arena.get(root).unwrap().objects.count(&Symbol::new("b")), 1);
        // step 0 (initial) + step 1
        assert_eq!(output.rows.len(), 4);
    }

    #[test]
    fn run_stops_at_step_cap_when_it_never_reaches_a_fixed_point() {
        // Rule regenerates its own left-hand side, so every step fires.
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("skin".into(), None, 1, m(&[("a", 1)]));
        let mut rules = RuleTable::new();
        rules.register(
            "skin",
            RuleKind::ObjectRule,
            Rule::new(Some("loop".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("a", 1)])), MoveCode::Here, 1.0, None, None, None).unwrap(),
        );
        let mut rng = StdSimRng::seeded(1);
        let mut trace = MemoryTraceSink::default();
        let mut output = MemoryOutputSink::default();
        let spec = OutputSpec { membrane: root, symbols: vec![Symbol::new("a")] };

        let report = run(&mut arena, &rules, root, Semantics::MinParallel, Some(5), &mut rng, &mut trace, &mut output, &spec).unwrap();

        assert_eq!(report.stop_reason, StopReason::StepCap);
        assert_eq!(report.steps_taken, 5);
    }
}
