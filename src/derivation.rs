//! # Derivation engine
//!
//! Chooses, per membrane and per step, which rules fire and at what
//! multiplicity, under the selected [`Semantics`]. Reads the
//! pre-step state only — firings are *collected* here and applied
//! later by the driver, so derivation never mutates the membrane tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::applicability::{applicable_rules, Applicable, ApplicableRule};
use crate::error::PSystemError;
use crate::membrane::{MembraneArena, MembraneId};
use crate::rng::SimRng;
use crate::rule::Rule;
use crate::rules_table::RuleTable;

/// The two derivation modes: at most one firing per membrane per step,
/// or a maximal non-extendable set of firings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Semantics {
    MinParallel,
    MaxParallel,
}

/// A single rule firing collected during derivation, ready to be
/// applied by the driver.
#[derive(Debug, Clone)]
pub struct DerivedFiring {
    pub membrane: MembraneId,
    pub rule: Rule,
    pub multiplicity: u32,
    /// Set for rules matched via `mem_idx` against a specific child
    /// (MEMwOB), so the driver can call `apply_move_mem` without
    /// re-resolving which child was meant.
    pub matched_child: Option<MembraneId>,
    pub matched_child_index: Option<usize>,
}

/// Walk the whole tree pre-order (ancestor before descendant) and
/// collect every membrane's firings for one step.
pub fn derive_step(
    arena: &MembraneArena,
    rules: &RuleTable,
    root: MembraneId,
    semantics: Semantics,
    rng: &mut dyn SimRng,
) -> Result<Vec<DerivedFiring>, PSystemError> {
    let mut out = Vec::new();
    for m in arena.walk_preorder(root) {
        let applicable = applicable_rules(arena, rules, m)?;
        if applicable.is_empty() {
            continue;
        }
        match semantics {
            Semantics::MinParallel => derive_min_parallel(m, &applicable, rng, &mut out),
            Semantics::MaxParallel => derive_max_parallel(arena, m, &applicable, rng, &mut out)?,
        }
    }
    Ok(out)
}

fn push_firing(membrane: MembraneId, chosen: &ApplicableRule, multiplicity: u32, out: &mut Vec<DerivedFiring>) {
    match chosen {
        ApplicableRule::Object(rule) => out.push(DerivedFiring {
            membrane,
            rule: rule.clone(),
            multiplicity,
            matched_child: None,
            matched_child_index: None,
        }),
        ApplicableRule::Membrane { rule, child, child_index } => out.push(DerivedFiring {
            membrane,
            rule: rule.clone(),
            multiplicity,
            matched_child: Some(*child),
            matched_child_index: Some(*child_index),
        }),
    }
}

/// At most one rule fires per membrane per step, chosen by
/// categorical sampling over (possibly normalized) probabilities, with
/// a virtual no-op absorbing the leftover mass when probabilities sum
/// to less than one.
fn derive_min_parallel(membrane: MembraneId, applicable: &Applicable, rng: &mut dyn SimRng, out: &mut Vec<DerivedFiring>) {
    let combined = applicable.combined();
    let probs: Vec<f64> = combined.iter().map(|a| a.rule().probability()).collect();
    let sum: f64 = probs.iter().sum();

    let (weights, noop_index) = if sum > 1.0 {
        (probs.iter().map(|p| p / sum).collect::<Vec<_>>(), None)
    } else if sum < 1.0 {
        let mut w = probs;
        w.push(1.0 - sum);
        let noop = w.len() - 1;
        (w, Some(noop))
    } else {
        (probs, None)
    };

    let Some(choice) = rng.weighted_choice(&weights) else { return };
    if Some(choice) == noop_index {
        return;
    }
    push_firing(membrane, &combined[choice], 1, out);
}

/// Greedy non-deterministic construction of a non-extendable
/// ("maximal") multiset of firings.
fn derive_max_parallel(
    arena: &MembraneArena,
    membrane: MembraneId,
    applicable: &Applicable,
    rng: &mut dyn SimRng,
    out: &mut Vec<DerivedFiring>,
) -> Result<(), PSystemError> {
    let combined = applicable.combined();
    let mut available = arena.get(membrane)?.objects.clone();

    let mut remaining: Vec<usize> = (0..combined.len()).collect();
    let mut counts: HashMap<usize, u32> = HashMap::new();

    // A rule whose probabilistic gate keeps failing while no rule's
    // `contains_copies` ever reaches zero could in principle loop
    // forever in principle. Cap attempts generously; hitting the cap is measure
    // zero under a real RNG and simply stops growing the group early.
    let max_attempts = remaining.len().saturating_mul(64).max(256);
    let mut attempts = 0usize;

    while !remaining.is_empty() && attempts < max_attempts {
        attempts += 1;
        let pick = rng.uniform_index(remaining.len()).expect("remaining is non-empty");
        let idx = remaining[pick];
        let rule = combined[idx].rule();

        if available.contains_copies(rule.left()) == 0 {
            remaining.swap_remove(pick);
            continue;
        }

        let p = rule.probability();
        if p < 1.0 && rng.gen_bool(1.0 - p) {
            continue;
        }

        *counts.entry(idx).or_insert(0) += 1;
        available = available.difference(rule.left());
    }
    if attempts >= max_attempts {
        tracing::warn!(membrane = ?membrane, "max_parallel_attempt_cap_reached");
    }

    let mut obj_firings: Vec<(usize, u32)> = Vec::new();
    let mut mem_firings: Vec<(usize, u32)> = Vec::new();
    for (idx, count) in counts {
        if combined[idx].rule().is_membrane_affecting() {
            mem_firings.push((idx, count));
        } else {
            obj_firings.push((idx, count));
        }
    }
    // Object-affecting firings before membrane-affecting ones, stable
    // by original applicable-list order within each bucket.
    obj_firings.sort_by_key(|(idx, _)| *idx);
    mem_firings.sort_by_key(|(idx, _)| *idx);

    for (idx, count) in obj_firings.into_iter().chain(mem_firings) {
        push_firing(membrane, &combined[idx], count, out);
    }
    Ok(())
}
