//! # Multiset
//!
//! A mapping from object [`Symbol`] to positive multiplicity. A symbol
//! with multiplicity `0` is never stored — `count`, `contains_copies`
//! and the pointwise algebra all treat an absent key and a `0` entry
//! identically, but only the former is ever observable through
//! iteration.
//!
//! ```
//! use psystem::multiset::Multiset;
//! use psystem::symbol::Symbol;
//!
//! let mut m = Multiset::new();
//! m.add(Symbol::new("a"), 3);
//! assert_eq!(m.count(&Symbol::new("a")), 3);
//! assert!(m.sub(&Symbol::new("a"), 1));
//! assert_eq!(m.count(&Symbol::new("a")), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::symbol::Symbol;

/// Sentinel returned by [`Multiset::contains_copies`] for an empty
/// right-hand side, standing in for `+∞`. Callers must special-case it
/// (spec boundary behavior) rather than treat it as a real multiplicity.
pub const UNBOUNDED_COPIES: u32 = u32::MAX;

/// A bag of symbols with positive integer multiplicities.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Multiset(BTreeMap<Symbol, u32>);

impl Multiset {
    pub fn new() -> Self {
        Multiset(BTreeMap::new())
    }

    /// Build a multiset from `(symbol, count)` pairs. Entries with count
    /// `0` are dropped; this is a convenience constructor, not a
    /// validated entry point (use [`Multiset::add`] to detect misuse).
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Symbol, u32)>) -> Self {
        let mut m = Multiset::new();
        for (s, n) in pairs {
            if n > 0 {
                m.0.insert(s, n);
            }
        }
        m
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, u32)> {
        self.0.iter().map(|(s, n)| (s, *n))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.0.keys()
    }

    /// Current multiplicity of `s`, `0` if absent.
    pub fn count(&self, s: &Symbol) -> u32 {
        self.0.get(s).copied().unwrap_or(0)
    }

    /// Increment `s` by `n`. `n == 0` is a no-op returning `false`;
    /// `n < 0` can't be expressed with `u32` at the type level, so the
    /// fallible entry point is [`Multiset::try_add`] for callers that
    /// receive a signed count from outside the type system (e.g. a
    /// scene-description collaborator).
    pub fn add(&mut self, s: Symbol, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        *self.0.entry(s).or_insert(0) += n;
        true
    }

    /// As [`Multiset::add`], but accepts a signed count and returns a
    /// domain error for `n < 0` instead of panicking.
    pub fn try_add(&mut self, s: Symbol, n: i64) -> Result<bool, crate::error::DomainError> {
        if n < 0 {
            return Err(crate::error::DomainError::NegativeMultiplicity { symbol: s, n });
        }
        Ok(self.add(s, n as u32))
    }

    /// Decrement `s` by `n`. `n == 0` is a no-op returning `false`.
    /// If the current count is less than `n`, state is left unchanged
    /// and `false` is returned. Removes the key entirely when the
    /// count reaches zero.
    pub fn sub(&mut self, s: &Symbol, n: u32) -> bool {
        if n == 0 {
            return false;
        }
        match self.0.get_mut(s) {
            Some(cur) if *cur > n => {
                *cur -= n;
                true
            }
            Some(cur) if *cur == n => {
                self.0.remove(s);
                true
            }
            _ => false,
        }
    }

    /// The largest `k` such that `k * other <= self`, or
    /// [`UNBOUNDED_COPIES`] when `other` is empty. Short-circuits to
    /// `0` as soon as any factor is zero.
    pub fn contains_copies(&self, other: &Multiset) -> u32 {
        if other.is_empty() {
            return UNBOUNDED_COPIES;
        }
        let mut best = UNBOUNDED_COPIES;
        for (s, n) in other.iter() {
            if n == 0 {
                continue;
            }
            let have = self.count(s);
            let factor = have / n;
            if factor == 0 {
                return 0;
            }
            best = best.min(factor);
        }
        best
    }

    /// `self >= other` — every symbol in `other` has at least as many
    /// copies in `self`. Equivalent to `contains_copies(other) >= 1`
    /// but avoids the unbounded-copies special case when `other` is
    /// empty (vacuously true).
    pub fn satisfies(&self, other: &Multiset) -> bool {
        other.iter().all(|(s, n)| self.count(s) >= n)
    }

    /// Pointwise minimum.
    pub fn intersection(&self, other: &Multiset) -> Multiset {
        let mut out = Multiset::new();
        for (s, n) in self.iter() {
            let m = other.count(s);
            if m > 0 {
                out.0.insert(s.clone(), n.min(m));
            }
        }
        out
    }

    /// Pointwise maximum.
    pub fn union(&self, other: &Multiset) -> Multiset {
        let mut out = self.clone();
        for (s, n) in other.iter() {
            let entry = out.0.entry(s.clone()).or_insert(0);
            *entry = (*entry).max(n);
        }
        out
    }

    /// Pointwise sum.
    pub fn sum(&self, other: &Multiset) -> Multiset {
        let mut out = self.clone();
        for (s, n) in other.iter() {
            *out.0.entry(s.clone()).or_insert(0) += n;
        }
        out
    }

    /// Pointwise difference, saturating at zero per symbol (entries
    /// that would go negative are dropped, mirroring repeated `sub`
    /// calls rather than failing).
    pub fn difference(&self, other: &Multiset) -> Multiset {
        let mut out = self.clone();
        for (s, n) in other.iter() {
            if let Some(cur) = out.0.get_mut(s) {
                if *cur > n {
                    *cur -= n;
                } else {
                    out.0.remove(s);
                }
            }
        }
        out
    }

    /// Scale every multiplicity by `k` (used to build `k * rule.left`).
    pub fn scale(&self, k: u32) -> Multiset {
        if k == 0 {
            return Multiset::new();
        }
        Multiset(self.0.iter().map(|(s, n)| (s.clone(), n * k)).collect())
    }
}

impl fmt::Debug for Multiset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (s, n)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{s}:{n}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Multiset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromIterator<(Symbol, u32)> for Multiset {
    fn from_iter<T: IntoIterator<Item = (Symbol, u32)>>(iter: T) -> Self {
        Multiset::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    #[test]
    fn add_zero_is_noop() {
        let mut m = Multiset::new();
        assert!(!m.add(sym("a"), 0));
        assert_eq!(m.count(&sym("a")), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn sub_more_than_present_leaves_state_unchanged() {
        let mut m = Multiset::from_pairs([(sym("a"), 2)]);
        assert!(!m.sub(&sym("a"), 3));
        assert_eq!(m.count(&sym("a")), 2);
    }

    #[test]
    fn sub_to_zero_removes_key() {
        let mut m = Multiset::from_pairs([(sym("a"), 2)]);
        assert!(m.sub(&sym("a"), 2));
        assert_eq!(m.count(&sym("a")), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn contains_copies_of_empty_is_unbounded() {
        let m = Multiset::from_pairs([(sym("a"), 5)]);
        assert_eq!(m.contains_copies(&Multiset::new()), UNBOUNDED_COPIES);
    }

    #[test]
    fn contains_copies_short_circuits_to_zero() {
        let m = Multiset::from_pairs([(sym("a"), 5)]);
        let need = Multiset::from_pairs([(sym("a"), 1), (sym("b"), 1)]);
        assert_eq!(m.contains_copies(&need), 0);
    }

    #[test]
    fn contains_copies_is_the_floor_of_the_min_ratio() {
        let m = Multiset::from_pairs([(sym("a"), 7), (sym("b"), 3)]);
        let need = Multiset::from_pairs([(sym("a"), 2), (sym("b"), 1)]);
        assert_eq!(m.contains_copies(&need), 3);
    }

    #[test]
    fn sum_then_difference_is_identity() {
        let a = Multiset::from_pairs([(sym("a"), 3), (sym("b"), 1)]);
        let b = Multiset::from_pairs([(sym("b"), 1), (sym("c"), 2)]);
        assert_eq!(a.sum(&b).difference(&b), a);
    }

    #[test]
    fn intersection_and_union_are_idempotent() {
        let a = Multiset::from_pairs([(sym("a"), 3), (sym("b"), 1)]);
        assert_eq!(a.intersection(&a), a);
        assert_eq!(a.union(&a), a);
    }

    #[test]
    fn negative_add_is_a_domain_error() {
        let mut m = Multiset::new();
        assert!(m.try_add(sym("a"), -1).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_symbol() -> impl Strategy<Value = Symbol> {
        prop_oneof![Just(sym("a")), Just(sym("b")), Just(sym("c")), Just(sym("d"))]
    }

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    fn arb_multiset() -> impl Strategy<Value = Multiset> {
        prop::collection::vec((arb_symbol(), 0u32..20), 0..6)
            .prop_map(Multiset::from_pairs)
    }

    proptest! {
        #[test]
        fn sum_minus_other_recovers_original(a in arb_multiset(), b in arb_multiset()) {
            prop_assert_eq!(a.sum(&b).difference(&b), a);
        }

        #[test]
        fn intersection_is_idempotent(a in arb_multiset()) {
            prop_assert_eq!(a.intersection(&a), a);
        }

        #[test]
        fn union_is_idempotent(a in arb_multiset()) {
            prop_assert_eq!(a.union(&a), a);
        }

        #[test]
        fn contains_copies_times_rhs_is_bounded_by_self(a in arb_multiset(), b in arb_multiset()) {
            let k = a.contains_copies(&b);
            if k != UNBOUNDED_COPIES {
                let scaled = b.scale(k);
                prop_assert!(a.satisfies(&scaled));
            }
        }

        #[test]
        fn no_entry_is_ever_nonpositive(a in arb_multiset(), b in arb_multiset()) {
            for (_, n) in a.difference(&b).iter() {
                prop_assert!(n > 0);
            }
            for (_, n) in a.intersection(&b).iter() {
                prop_assert!(n > 0);
            }
        }
    }
}
