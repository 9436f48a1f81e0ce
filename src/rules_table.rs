//! # Rule table
//!
//! Storage for a system's rules, keyed by `(membrane-id, rule-kind)`,
//! preserving registration order as the order later phases iterate in.

use std::collections::HashMap;

use crate::rule::{Rule, RuleKind};

/// `(membrane-id, rule-kind) -> ordered Vec<Rule>`.
#[derive(Debug, Default)]
pub struct RuleTable {
    entries: HashMap<(String, RuleKind), Vec<Rule>>,
}

impl RuleTable {
    pub fn new() -> Self {
        RuleTable { entries: HashMap::new() }
    }

    /// Register a rule under `membrane_id`/`kind`, appending to the
    /// existing list to preserve registration order (the order the
    /// applicability engine iterates in).
    pub fn register(&mut self, membrane_id: impl Into<String>, kind: RuleKind, rule: Rule) {
        self.entries.entry((membrane_id.into(), kind)).or_default().push(rule);
    }

    pub fn rules_for(&self, membrane_id: &str, kind: RuleKind) -> &[Rule] {
        self.entries
            .get(&(membrane_id.to_string(), kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn object_rules_for(&self, membrane_id: &str) -> &[Rule] {
        self.rules_for(membrane_id, RuleKind::ObjectRule)
    }

    pub fn membrane_rules_for(&self, membrane_id: &str) -> &[Rule] {
        self.rules_for(membrane_id, RuleKind::MembraneRule)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::Multiset;
    use crate::rule::{MoveCode, RuleRight};
    use crate::symbol::Symbol;

    fn rule(id: &str) -> Rule {
        Rule::new(
            Some(id.into()),
            Multiset::from_pairs([(Symbol::new("a"), 1)]),
            RuleRight::Simple(Multiset::from_pairs([(Symbol::new("b"), 1)])),
            MoveCode::Here,
            1.0,
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn registration_order_is_preserved() {
        let mut table = RuleTable::new();
        table.register("s", RuleKind::ObjectRule, rule("r1"));
        table.register("s", RuleKind::ObjectRule, rule("r2"));
        let ids: Vec<_> = table.object_rules_for("s").iter().map(|r| r.id().unwrap()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
    }

    #[test]
    fn unknown_membrane_returns_empty_slice() {
        let table = RuleTable::new();
        assert!(table.object_rules_for("nope").is_empty());
    }
}
