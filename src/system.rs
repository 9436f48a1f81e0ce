//! # System
//!
//! The top-level value a collaborator builds and hands to the driver:
//! an alphabet, a membrane tree, a rule table, an output spec, and the
//! derivation semantics to run under. Scene-file parsing into this
//! shape is out of scope; callers build it programmatically, as
//! `src/main.rs` does.

use crate::derivation::Semantics;
use crate::driver::{self, OutputSpec, SimulationReport};
use crate::error::PSystemError;
use crate::membrane::MembraneArena;
use crate::membrane::MembraneId;
use crate::observers::{OutputSink, TraceSink};
use crate::rng::SimRng;
use crate::rules_table::RuleTable;
use crate::symbol::Alphabet;

/// A fully-assembled P-system, ready to run.
pub struct System {
    pub alphabet: Alphabet,
    pub arena: MembraneArena,
    pub root: MembraneId,
    pub rules: RuleTable,
    pub output: OutputSpec,
    pub semantics: Semantics,
}

impl System {
    pub fn new(alphabet: Alphabet, arena: MembraneArena, root: MembraneId, rules: RuleTable, output: OutputSpec, semantics: Semantics) -> Self {
        System { alphabet, arena, root, rules, output, semantics }
    }

    /// Run to a fixed point or `max_steps`.
    pub fn run(
        &mut self,
        max_steps: Option<u64>,
        rng: &mut dyn SimRng,
        trace: &mut dyn TraceSink,
        output: &mut dyn OutputSink,
    ) -> Result<SimulationReport, PSystemError> {
        driver::run(&mut self.arena, &self.rules, self.root, self.semantics, max_steps, rng, trace, output, &self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;
    use crate::observers::{MemoryOutputSink, MemoryTraceSink};
    use crate::rng::StdSimRng;
    use crate::rule::{MoveCode, Rule, RuleKind, RuleRight};
    use crate::symbol::Symbol;

    #[test]
    fn a_one_membrane_system_runs_to_a_fixed_point() {
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("skin".into(), None, 1, Multiset::from_pairs([(Symbol::new("a"), 2)]));
        let mut rules = RuleTable::new();
        rules.register(
            "skin",
            RuleKind::ObjectRule,
            Rule::new(
                Some("r1".into()),
                Multiset::from_pairs([(Symbol::new("a"), 1)]),
                RuleRight::Simple(Multiset::from_pairs([(Symbol::new("b"), 1)])),
                MoveCode::Here,
                1.0,
                None,
                None,
                None,
            )
            .unwrap(),
        );
        let alphabet = Alphabet::new(vec![Symbol::new("a"), Symbol::new("b")]);
        let output = OutputSpec { membrane: root, symbols: vec![Symbol::new("a"), Symbol::new("b")] };
        let mut system = System::new(alphabet, arena, root, rules, output, Semantics::MaxParallel);

        let mut rng = StdSimRng::seeded(3);
        let mut trace = MemoryTraceSink::default();
        let mut out = MemoryOutputSink::default();
        let report = system.run(Some(20), &mut rng, &mut trace, &mut out).unwrap();

        assert_eq!(report.total_firings_applied, 1);
        assert_eq!(system.arena.get(system.root).unwrap().objects.count(&Symbol::new("a")), 0);
        assert_eq!(system.arena.get(system.root).unwrap().objects.count(&Symbol::new("b")), 2);
    }
}
