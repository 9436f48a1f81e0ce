//! # Membrane tree
//!
//! The membrane tree is stored in a [`MembraneArena`]: a flat `Vec` of
//! slots addressed by a generational [`MembraneId`], rather than the
//! `Rc`/`Weak` parent-child pointers a naive port would reach for.
//! Dissolving a membrane frees its slot and bumps its generation, so a
//! [`MembraneId`] captured before dissolution becomes detectably stale
//! (`StructuralError::StaleMembraneId`) instead of resolving to
//! whatever later reuses the slot.

use crate::error::{PSystemError, StructuralError};
use crate::multiset::Multiset;
use crate::rule::{DmemTarget, Rule, RuleRight};
use crate::rng::SimRng;

/// A generational handle into a [`MembraneArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MembraneId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<MembraneNode>,
}

/// A node in the membrane tree.
#[derive(Debug, Clone)]
pub struct MembraneNode {
    /// Not necessarily unique across the tree.
    pub id: String,
    pub multiplicity: u32,
    /// Carried for completeness; never enforced.
    pub capacity: Option<u32>,
    pub objects: Multiset,
    parent: Option<MembraneId>,
    children: Vec<MembraneId>,
}

impl MembraneNode {
    pub fn parent(&self) -> Option<MembraneId> {
        self.parent
    }

    pub fn children(&self) -> &[MembraneId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Outcome of an `apply_*` call, distinguishing the soft/semantic cases
/// from genuine failure. Only `Applied` and
/// `DiscardedAtRoot` represent a mutation that happened; `NotApplicable`
/// means the caller should record a `NOT Applied` trace line and move
/// on, per the best-effort-sequential policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// `apply_out` fired at the skin: products discarded.
    DiscardedAtRoot,
    /// Re-validation at apply time found the precondition no longer
    /// holds (e.g. insufficient objects, or a referenced membrane was
    /// dissolved earlier in the same step).
    NotApplicable,
}

/// Owns every membrane in a P-system as a flat, generational arena.
#[derive(Debug, Default)]
pub struct MembraneArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
}

impl MembraneArena {
    pub fn new() -> Self {
        MembraneArena { slots: Vec::new(), free: Vec::new() }
    }

    fn alloc(&mut self, node: MembraneNode) -> MembraneId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            MembraneId { index, generation: slot.generation }
        } else {
            let index = self.slots.len();
            self.slots.push(Slot { generation: 0, node: Some(node) });
            MembraneId { index, generation: 0 }
        }
    }

    /// Insert a membrane with no parent (the skin).
    pub fn insert_root(&mut self, id: String, capacity: Option<u32>, multiplicity: u32, objects: Multiset) -> MembraneId {
        self.alloc(MembraneNode { id, multiplicity, capacity, objects, parent: None, children: Vec::new() })
    }

    /// Insert a membrane as a new last child of `parent`.
    pub fn insert_child(
        &mut self,
        parent: MembraneId,
        id: String,
        capacity: Option<u32>,
        multiplicity: u32,
        objects: Multiset,
    ) -> Result<MembraneId, PSystemError> {
        self.check_alive(parent)?;
        let child = self.alloc(MembraneNode {
            id,
            multiplicity,
            capacity,
            objects,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.slot_mut(parent)?.children.push(child);
        Ok(child)
    }

    fn check_alive(&self, id: MembraneId) -> Result<(), PSystemError> {
        self.get(id).map(|_| ())
    }

    fn slot(&self, id: MembraneId) -> Result<&MembraneNode, PSystemError> {
        self.get(id)
    }

    fn slot_mut(&mut self, id: MembraneId) -> Result<&mut MembraneNode, PSystemError> {
        self.get_mut(id)
    }

    pub fn get(&self, id: MembraneId) -> Result<&MembraneNode, PSystemError> {
        let slot = self
            .slots
            .get(id.index)
            .ok_or(StructuralError::UnknownMembraneId(id))?;
        if slot.generation != id.generation || slot.node.is_none() {
            return Err(StructuralError::StaleMembraneId(id).into());
        }
        Ok(slot.node.as_ref().unwrap())
    }

    pub fn get_mut(&mut self, id: MembraneId) -> Result<&mut MembraneNode, PSystemError> {
        let slot = self
            .slots
            .get_mut(id.index)
            .ok_or(StructuralError::UnknownMembraneId(id))?;
        if slot.generation != id.generation || slot.node.is_none() {
            return Err(StructuralError::StaleMembraneId(id).into());
        }
        Ok(slot.node.as_mut().unwrap())
    }

    pub fn is_alive(&self, id: MembraneId) -> bool {
        self.get(id).is_ok()
    }

    /// First child of `parent` whose `id` equals `name` (membrane ids
    /// are not unique across the tree; ties break on
    /// stored order).
    pub fn resolve_child_by_name(&self, parent: MembraneId, name: &str) -> Result<Option<MembraneId>, PSystemError> {
        let node = self.slot(parent)?;
        for &c in &node.children {
            if self.slot(c)?.id == name {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// `apply_here(R, k)`: subtract k·left from self; add k·right
    /// to self. Re-validates readiness at apply time (best-effort
    /// sequential policy).
    pub fn apply_here(&mut self, id: MembraneId, rule: &Rule, k: u32) -> Result<ApplyOutcome, PSystemError> {
        if k == 0 {
            return Ok(ApplyOutcome::Applied);
        }
        let right = rule.right().as_simple().cloned().unwrap_or_default();
        let node = self.slot_mut(id)?;
        let need = rule.left().scale(k);
        if !node.objects.satisfies(&need) {
            return Ok(ApplyOutcome::NotApplicable);
        }
        node.objects = node.objects.difference(&need).sum(&right.scale(k));
        Ok(ApplyOutcome::Applied)
    }

    /// `apply_out(R, k)`: subtract k·left from self; add k·right to
    /// parent, or discard (soft, traced) if `self` is the root.
    pub fn apply_out(&mut self, id: MembraneId, rule: &Rule, k: u32) -> Result<ApplyOutcome, PSystemError> {
        if k == 0 {
            return Ok(ApplyOutcome::Applied);
        }
        let need = rule.left().scale(k);
        let parent = {
            let node = self.slot(id)?;
            if !node.objects.satisfies(&need) {
                return Ok(ApplyOutcome::NotApplicable);
            }
            node.parent
        };
        let right = rule.right().as_simple().cloned().unwrap_or_default();
        let remaining = self.slot(id)?.objects.difference(&need);
        self.slot_mut(id)?.objects = remaining;
        match parent {
            None => Ok(ApplyOutcome::DiscardedAtRoot),
            Some(p) => {
                let node = self.slot_mut(p)?;
                node.objects = node.objects.sum(&right.scale(k));
                Ok(ApplyOutcome::Applied)
            }
        }
    }

    /// `apply_in(R, dest, k)`: subtract k·left from self; add
    /// k·right to the specific child `dest`.
    pub fn apply_in(&mut self, id: MembraneId, dest: MembraneId, rule: &Rule, k: u32) -> Result<ApplyOutcome, PSystemError> {
        if k == 0 {
            return Ok(ApplyOutcome::Applied);
        }
        let is_child = self.slot(id)?.children.contains(&dest);
        if !is_child {
            return Err(StructuralError::DestinationNotAChild(
                self.get(dest).map(|n| n.id.clone()).unwrap_or_default(),
            )
            .into());
        }
        let need = rule.left().scale(k);
        {
            let node = self.slot(id)?;
            if !node.objects.satisfies(&need) {
                return Ok(ApplyOutcome::NotApplicable);
            }
        }
        let right = rule.right().as_simple().cloned().unwrap_or_default();
        let remaining = self.slot(id)?.objects.difference(&need);
        self.slot_mut(id)?.objects = remaining;
        let dest_node = self.slot_mut(dest)?;
        dest_node.objects = dest_node.objects.sum(&right.scale(k));
        Ok(ApplyOutcome::Applied)
    }

    /// `apply_move_mem(R, dest, child_index)`: remove the child at
    /// `child_index` from `self`, apply `rule` to it once with HERE
    /// semantics, then re-parent it under `dest`.
    pub fn apply_move_mem(
        &mut self,
        id: MembraneId,
        dest: MembraneId,
        child_index: usize,
        rule: &Rule,
    ) -> Result<ApplyOutcome, PSystemError> {
        self.check_alive(dest)?;
        let child = {
            let node = self.slot(id)?;
            *node.children.get(child_index).ok_or(StructuralError::ChildIndexOutOfRange {
                parent: id,
                index: child_index,
                len: node.children.len(),
            })?
        };
        {
            let need = rule.left();
            let child_node = self.slot(child)?;
            if !child_node.objects.satisfies(need) {
                return Ok(ApplyOutcome::NotApplicable);
            }
        }
        match self.apply_here(child, rule, 1)? {
            ApplyOutcome::Applied => {}
            other => return Ok(other),
        }
        self.slot_mut(id)?.children.remove(child_index);
        self.slot_mut(dest)?.children.push(child);
        self.slot_mut(child)?.parent = Some(dest);
        Ok(ApplyOutcome::Applied)
    }

    /// `apply_dissolve_to_parent(R)`: apply `rule` once (HERE) to
    /// `self`, merge `self`'s resulting objects into the parent, remove
    /// `self` from the parent's children, and splice `self`'s children
    /// into the parent's child list at the point `self` occupied.
    pub fn apply_dissolve_to_parent(&mut self, id: MembraneId, rule: &Rule) -> Result<ApplyOutcome, PSystemError> {
        let parent = self.slot(id)?.parent;
        let Some(parent) = parent else {
            // Dissolving the skin has no parent to merge into; treated
            // as not applicable rather than a crash (mirrors apply_out
            // at the root being a documented soft case).
            return Ok(ApplyOutcome::NotApplicable);
        };
        match self.apply_here(id, rule, 1)? {
            ApplyOutcome::Applied => {}
            other => return Ok(other),
        }
        let (dissolved_objects, dissolved_children) = {
            let node = self.slot(id)?;
            (node.objects.clone(), node.children.clone())
        };
        for &c in &dissolved_children {
            self.slot_mut(c)?.parent = Some(parent);
        }
        {
            let parent_node = self.slot_mut(parent)?;
            parent_node.objects = parent_node.objects.sum(&dissolved_objects);
            let at = parent_node
                .children
                .iter()
                .position(|&c| c == id)
                .expect("dissolved membrane must be a child of its own parent");
            parent_node.children.splice(at..=at, dissolved_children);
        }
        self.free_node(id);
        Ok(ApplyOutcome::Applied)
    }

    /// `apply_dmem(R, k)`: subtract k·left from self; route each
    /// right-hand entry either to `self` (HERE) or, for sibling
    /// entries, to every sibling matching the target id, each
    /// independently gated by `rule.probability()`.
    pub fn apply_dmem(
        &mut self,
        id: MembraneId,
        rule: &Rule,
        k: u32,
        rng: &mut dyn SimRng,
    ) -> Result<ApplyOutcome, PSystemError> {
        let RuleRight::Dmem(entries) = rule.right() else {
            return Ok(ApplyOutcome::NotApplicable);
        };
        if k == 0 {
            return Ok(ApplyOutcome::Applied);
        }
        let need = rule.left().scale(k);
        {
            let node = self.slot(id)?;
            if !node.objects.satisfies(&need) {
                return Ok(ApplyOutcome::NotApplicable);
            }
        }
        let parent = self.slot(id)?.parent;
        let remaining = self.slot(id)?.objects.difference(&need);
        self.slot_mut(id)?.objects = remaining;

        for entry in entries {
            match &entry.target {
                DmemTarget::Here => {
                    let node = self.slot_mut(id)?;
                    node.objects.add(entry.symbol.clone(), entry.count * k);
                }
                DmemTarget::Sibling(name) => {
                    let Some(parent) = parent else { continue };
                    let siblings: Vec<MembraneId> = self
                        .slot(parent)?
                        .children
                        .iter()
                        .copied()
                        .filter(|&c| c != id)
                        .collect();
                    for sib in siblings {
                        if self.slot(sib)?.id != *name {
                            continue;
                        }
                        if rng.gen_bool(rule.probability()) {
                            let sib_node = self.slot_mut(sib)?;
                            sib_node.objects.add(entry.symbol.clone(), entry.count * k);
                        }
                    }
                }
            }
        }
        Ok(ApplyOutcome::Applied)
    }

    fn free_node(&mut self, id: MembraneId) {
        let slot = &mut self.slots[id.index];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
    }

    /// Pre-order walk (parent before children, children in stored
    /// order) starting at `root`, per the ordering guarantee.
    pub fn walk_preorder(&self, root: MembraneId) -> Vec<MembraneId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        // Reverse-push to keep first-child-first while using a stack.
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Ok(node) = self.get(id) {
                for &c in node.children().iter().rev() {
                    stack.push(c);
                }
            }
        }
        out
    }
}
