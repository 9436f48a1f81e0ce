//! # Rule
//!
//! An immutable descriptor of a rewriting. Rules are pure value objects
//! with no behavior beyond accessors and the canonical textual
//! rendering used by the trace sink (`canonical_repr`).

use std::fmt;

use crate::error::DomainError;
use crate::membrane::MembraneId;
use crate::multiset::Multiset;
use crate::symbol::Symbol;

/// Move code selecting where a rule's products go.
///
/// This port implements `{HERE, OUT, IN, MEMwOB, DISS_KEEP, DMEM}`.
/// The remaining move codes (`Mem`, `Diss`, `MemTrans`, `GroupTrans`,
/// `MemWc`) are kept as named
/// variants so a rule built with one of them is a structured,
/// recognizable condition rather than an opaque string — but
/// [`Rule::new`] rejects them with [`DomainError::UnsupportedMove`]
/// instead of silently ignoring them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveCode {
    Here,
    Out,
    In,
    MemWithObjects,
    DissolveKeep,
    Dmem,
    // Recognized but unsupported by this port; see module docs.
    Mem,
    Dissolve,
    MemTrans,
    GroupTrans,
    MemWc,
}

impl MoveCode {
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            MoveCode::Here
                | MoveCode::Out
                | MoveCode::In
                | MoveCode::MemWithObjects
                | MoveCode::DissolveKeep
                | MoveCode::Dmem
        )
    }

    /// Name used in the trace file format.
    pub fn trace_name(self) -> &'static str {
        match self {
            MoveCode::Here => "HERE",
            MoveCode::Out => "OUT",
            MoveCode::In => "IN",
            MoveCode::MemWithObjects => "MEMwOB",
            MoveCode::DissolveKeep => "DISS_KEEP",
            MoveCode::Dmem => "DMEM",
            MoveCode::Mem => "MEM",
            MoveCode::Dissolve => "DISS",
            MoveCode::MemTrans => "MEMTRANS",
            MoveCode::GroupTrans => "GROUP_TRANS",
            MoveCode::MemWc => "MEMWC",
        }
    }
}

impl fmt::Display for MoveCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.trace_name())
    }
}

/// Where one entry of a DMEM rule's right-hand side is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DmemTarget {
    /// Stays in the firing membrane.
    Here,
    /// Delivered to every sibling whose id matches, independently, with
    /// probability equal to the owning rule's `probability`.
    Sibling(String),
}

/// A single entry of a DMEM rule's right-hand side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmemEntry {
    pub target: DmemTarget,
    pub symbol: Symbol,
    pub count: u32,
}

/// The right-hand side of a rule: either a plain multiset (HERE/OUT/IN/
/// MEMwOB/DISS_KEEP) or a by-target list (DMEM). Modeled as a tagged
/// sum rather than by inheritance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRight {
    Simple(Multiset),
    Dmem(Vec<DmemEntry>),
}

impl RuleRight {
    /// The plain multiset, when this is a [`RuleRight::Simple`]. DMEM
    /// rules have no single "the right-hand side" multiset; callers
    /// that need one should go entry-by-entry.
    pub fn as_simple(&self) -> Option<&Multiset> {
        match self {
            RuleRight::Simple(m) => Some(m),
            RuleRight::Dmem(_) => None,
        }
    }
}

/// An immutable rewriting rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    id: Option<String>,
    left: Multiset,
    right: RuleRight,
    move_code: MoveCode,
    /// `p` in `[0, 1]`, stored as bits so `Rule` can derive `Eq`.
    probability_bits: u64,
    priority: Option<Vec<String>>,
    destination: Option<String>,
    /// Membrane rules only: id of the child membrane matched on the LHS.
    mem_idx: Option<String>,
}

impl Rule {
    /// Construct a rule, validating cross-field invariants: a
    /// non-empty `priority` requires a non-empty
    /// `id`, and `move_code` must
    /// be one of the move codes this port implements.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Option<String>,
        left: Multiset,
        right: RuleRight,
        move_code: MoveCode,
        probability: f64,
        priority: Option<Vec<String>>,
        destination: Option<String>,
        mem_idx: Option<String>,
    ) -> Result<Self, DomainError> {
        if !move_code.is_supported() {
            return Err(DomainError::UnsupportedMove(move_code));
        }
        let priority = priority.filter(|p| !p.is_empty());
        if priority.is_some() && id.as_deref().unwrap_or("").is_empty() {
            return Err(DomainError::PriorityWithoutId { id });
        }
        Ok(Rule {
            id,
            left,
            right,
            move_code,
            probability_bits: probability.clamp(0.0, 1.0).to_bits(),
            priority,
            destination,
            mem_idx,
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn left(&self) -> &Multiset {
        &self.left
    }

    pub fn right(&self) -> &RuleRight {
        &self.right
    }

    pub fn move_code(&self) -> MoveCode {
        self.move_code
    }

    pub fn probability(&self) -> f64 {
        f64::from_bits(self.probability_bits)
    }

    pub fn priority(&self) -> Option<&[String]> {
        self.priority.as_deref()
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn mem_idx(&self) -> Option<&str> {
        self.mem_idx.as_deref()
    }

    pub fn is_membrane_rule(&self) -> bool {
        self.mem_idx.is_some()
    }

    /// Whether this rule's readiness check should bucket it as
    /// membrane-affecting for max-parallel's object/membrane split
    /// (`DISS_KEEP` is the only supported move in the
    /// `{DISS, DISS_KEEP}` bucket).
    pub fn is_membrane_affecting(&self) -> bool {
        matches!(self.move_code, MoveCode::DissolveKeep)
    }

    /// Canonical single-line rendering: id, left, right, probability,
    /// priority, move, destination, mem_idx.
    pub fn canonical_repr(&self) -> String {
        let right_repr = match &self.right {
            RuleRight::Simple(m) => format!("{m:?}"),
            RuleRight::Dmem(entries) => {
                let parts: Vec<String> = entries
                    .iter()
                    .map(|e| match &e.target {
                        DmemTarget::Here => format!("HERE:{}x{}", e.symbol, e.count),
                        DmemTarget::Sibling(id) => format!("{id}:{}x{}", e.symbol, e.count),
                    })
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
        };
        format!(
            "Rule(id={}, left={:?}, right={}, prob={}, prior={:?}, move={}, destination={:?}, mem_idx={:?})",
            self.id.as_deref().unwrap_or("_"),
            self.left,
            right_repr,
            self.probability(),
            self.priority,
            self.move_code,
            self.destination,
            self.mem_idx,
        )
    }

    /// `k * left`, used throughout the applicability/derivation engines.
    pub fn scaled_left(&self, k: u32) -> Multiset {
        self.left.scale(k)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_repr())
    }
}

/// `(membrane-id, rule-kind)` lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ObjectRule,
    MembraneRule,
}

/// A rule queued to fire, paired with the multiplicity chosen by the
/// derivation engine and (for membrane rules) the concrete child
/// [`MembraneId`] it matched on the LHS at the time it was collected.
#[derive(Debug, Clone)]
pub struct QueuedFiring {
    pub rule: Rule,
    pub multiplicity: u32,
    pub matched_child: Option<MembraneId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(pairs: &[(&str, u32)]) -> Multiset {
        Multiset::from_pairs(pairs.iter().map(|(s, n)| (Symbol::new(*s), *n)))
    }

    #[test]
    fn priority_without_id_is_rejected() {
        let r = Rule::new(
            None,
            m(&[("a", 1)]),
            RuleRight::Simple(m(&[("b", 1)])),
            MoveCode::Here,
            1.0,
            Some(vec!["r1".into()]),
            None,
            None,
        );
        assert!(matches!(r, Err(DomainError::PriorityWithoutId { .. })));
    }

    #[test]
    fn empty_priority_list_is_treated_as_none() {
        let r = Rule::new(
            None,
            m(&[("a", 1)]),
            RuleRight::Simple(m(&[("b", 1)])),
            MoveCode::Here,
            1.0,
            Some(vec![]),
            None,
            None,
        )
        .unwrap();
        assert!(r.priority().is_none());
    }

    #[test]
    fn unsupported_move_is_rejected() {
        let r = Rule::new(
            Some("r1".into()),
            m(&[("a", 1)]),
            RuleRight::Simple(m(&[("b", 1)])),
            MoveCode::Mem,
            1.0,
            None,
            None,
            None,
        );
        assert!(matches!(r, Err(DomainError::UnsupportedMove(_))));
    }

    #[test]
    fn canonical_repr_contains_all_named_fields() {
        let r = Rule::new(
            Some("r1".into()),
            m(&[("a", 1)]),
            RuleRight::Simple(m(&[("b", 1)])),
            MoveCode::Here,
            0.5,
            None,
            Some("c1".into()),
            None,
        )
        .unwrap();
        let repr = r.canonical_repr();
        for needle in ["id=r1", "left=", "right=", "prob=0.5", "move=HERE", "destination="] {
            assert!(repr.contains(needle), "missing {needle} in {repr}");
        }
    }
}
