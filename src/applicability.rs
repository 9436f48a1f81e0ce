//! # Applicability engine
//!
//! Computes, for one membrane, the rules whose left-hand side is
//! satisfied by the current state: object rules against the membrane's
//! own objects, and membrane rules against each child's objects,
//! subject to a priority filter: a rule naming an already-accepted
//! dominator in its priority list is excluded.

use crate::error::PSystemError;
use crate::membrane::{MembraneArena, MembraneId};
use crate::rule::Rule;
use crate::rules_table::RuleTable;

/// Either shape of a ready rule, carrying whatever extra context the
/// derivation engine needs to apply it.
#[derive(Debug, Clone)]
pub enum ApplicableRule {
    Object(Rule),
    Membrane {
        rule: Rule,
        child: MembraneId,
        child_index: usize,
    },
}

impl ApplicableRule {
    pub fn rule(&self) -> &Rule {
        match self {
            ApplicableRule::Object(r) => r,
            ApplicableRule::Membrane { rule, .. } => rule,
        }
    }
}

/// The two applicable lists for one membrane.
#[derive(Debug, Clone, Default)]
pub struct Applicable {
    pub object_rules: Vec<Rule>,
    /// `(rule, matched child, child index within the membrane's
    /// children as of this computation)`, collected in reverse child
    /// order so that later index-based removal doesn't shift earlier
    /// indices still pending application.
    pub membrane_rules: Vec<(Rule, MembraneId, usize)>,
}

impl Applicable {
    pub fn is_empty(&self) -> bool {
        self.object_rules.is_empty() && self.membrane_rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.object_rules.len() + self.membrane_rules.len()
    }

    /// Concatenation of both lists, object rules first.
    pub fn combined(&self) -> Vec<ApplicableRule> {
        let mut out: Vec<ApplicableRule> = self.object_rules.iter().cloned().map(ApplicableRule::Object).collect();
        out.extend(self.membrane_rules.iter().map(|(r, c, i)| ApplicableRule::Membrane {
            rule: r.clone(),
            child: *c,
            child_index: *i,
        }));
        out
    }
}

/// Compute the applicable object and membrane rules for `membrane`.
pub fn applicable_rules(
    arena: &MembraneArena,
    rules: &RuleTable,
    membrane: MembraneId,
) -> Result<Applicable, PSystemError> {
    let node = arena.get(membrane)?;

    let mut accepted_ids: std::collections::HashSet<&str> = std::collections::HashSet::new();
    let mut object_rules = Vec::new();
    for r in rules.object_rules_for(&node.id) {
        if !node.objects.satisfies(r.left()) {
            continue;
        }
        if let Some(priority) = r.priority() {
            if priority.iter().any(|p| accepted_ids.contains(p.as_str())) {
                continue;
            }
        }
        if let Some(id) = r.id() {
            accepted_ids.insert(id);
        }
        object_rules.push(r.clone());
    }

    let mut membrane_rules = Vec::new();
    let children: Vec<MembraneId> = node.children().to_vec();
    for (index, &child_id) in children.iter().enumerate().rev() {
        let child = arena.get(child_id)?;
        for r in rules.membrane_rules_for(&node.id) {
            if r.mem_idx() == Some(child.id.as_str()) && child.objects.satisfies(r.left()) {
                membrane_rules.push((r.clone(), child_id, index));
            }
        }
    }

    Ok(Applicable { object_rules, membrane_rules })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;
    use crate::rule::{MoveCode, RuleKind, RuleRight};
    use crate::symbol::Symbol;

    fn m(pairs: &[(&str, u32)]) -> Multiset {
        Multiset::from_pairs(pairs.iter().map(|(s, n)| (Symbol::new(*s), *n)))
    }

    #[test]
    fn priority_excludes_dominated_rule_when_dominator_accepted() {
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("s".into(), None, 1, m(&[("a", 1)]));

        let mut rules = RuleTable::new();
        let r1 = Rule::new(Some("r1".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("b", 1)])), MoveCode::Here, 1.0, None, None, None).unwrap();
        let r2 = Rule::new(Some("r2".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("c", 1)])), MoveCode::Here, 1.0, Some(vec!["r1".into()]), None, None).unwrap();
        rules.register("s", RuleKind::ObjectRule, r1);
        rules.register("s", RuleKind::ObjectRule, r2);

        let applicable = applicable_rules(&arena, &rules, root).unwrap();
        let ids: Vec<_> = applicable.object_rules.iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["r1"]);
    }

    #[test]
    fn priority_referencing_unknown_id_imposes_no_constraint() {
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("s".into(), None, 1, m(&[("a", 1)]));
        let mut rules = RuleTable::new();
        let r = Rule::new(Some("r1".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("b", 1)])), MoveCode::Here, 1.0, Some(vec!["ghost".into()]), None, None).unwrap();
        rules.register("s", RuleKind::ObjectRule, r);
        let applicable = applicable_rules(&arena, &rules, root).unwrap();
        assert_eq!(applicable.object_rules.len(), 1);
    }

    #[test]
    fn unready_rule_is_not_applicable() {
        let mut arena = MembraneArena::new();
        let root = arena.insert_root("s".into(), None, 1, m(&[("a", 0)]));
        let mut rules = RuleTable::new();
        let r = Rule::new(Some("r1".into()), m(&[("a", 1)]), RuleRight::Simple(m(&[("b", 1)])), MoveCode::Here, 1.0, None, None, None).unwrap();
        rules.register("s", RuleKind::ObjectRule, r);
        let applicable = applicable_rules(&arena, &rules, root).unwrap();
        assert!(applicable.object_rules.is_empty());
    }
}
