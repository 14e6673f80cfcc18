//! Member hierarchy index
//!
//! Tablix members form an owned tree with no parent links. The index is
//! built once per hierarchy and answers the upward and positional questions
//! the renderer needs: a member's ancestors, its depth, and which body row
//! (or column) each leaf member stands for.

use std::ops::Range;

use crate::definition::TablixMember;

/// Pre-order position of a member within its hierarchy
pub type MemberId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberEntry {
    parent: Option<MemberId>,
    depth: usize,
    children: Vec<MemberId>,
    /// Leaf ordinals covered by this member
    leaves: Range<usize>,
    grouped: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyIndex {
    entries: Vec<MemberEntry>,
    roots: Vec<MemberId>,
    leaf_count: usize,
}

impl HierarchyIndex {
    pub fn build(members: &[TablixMember]) -> Self {
        let mut index = Self::default();
        let roots = members
            .iter()
            .map(|member| index.visit(member, None, 0))
            .collect();
        index.roots = roots;
        index
    }

    fn visit(&mut self, member: &TablixMember, parent: Option<MemberId>, depth: usize) -> MemberId {
        let id = self.entries.len();
        let first_leaf = self.leaf_count;
        self.entries.push(MemberEntry {
            parent,
            depth,
            children: Vec::new(),
            leaves: first_leaf..first_leaf,
            grouped: member.group.is_some(),
        });

        if member.is_leaf() {
            self.leaf_count += 1;
        } else {
            let children: Vec<MemberId> = member
                .children
                .iter()
                .map(|child| self.visit(child, Some(id), depth + 1))
                .collect();
            self.entries[id].children = children;
        }

        self.entries[id].leaves = first_leaf..self.leaf_count;
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roots(&self) -> &[MemberId] {
        &self.roots
    }

    pub fn children(&self, id: MemberId) -> &[MemberId] {
        self.entries
            .get(id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn parent(&self, id: MemberId) -> Option<MemberId> {
        self.entries.get(id).and_then(|e| e.parent)
    }

    pub fn depth(&self, id: MemberId) -> usize {
        self.entries.get(id).map_or(0, |e| e.depth)
    }

    /// Ancestors from the immediate parent up to the root
    pub fn ancestors(&self, id: MemberId) -> impl Iterator<Item = MemberId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Whether any ancestor carries a group
    pub fn has_grouped_ancestor(&self, id: MemberId) -> bool {
        self.ancestors(id).any(|a| self.entries[a].grouped)
    }

    /// Whether the member or any ancestor carries a group
    pub fn is_under_group(&self, id: MemberId) -> bool {
        self.entries.get(id).is_some_and(|e| e.grouped) || self.has_grouped_ancestor(id)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Body row (or column) ordinal of a leaf member
    pub fn leaf_ordinal(&self, id: MemberId) -> Option<usize> {
        let entry = self.entries.get(id)?;
        (entry.children.is_empty()).then_some(entry.leaves.start)
    }

    /// Leaf ordinals spanned by a member
    pub fn leaf_range(&self, id: MemberId) -> Range<usize> {
        self.entries.get(id).map_or(0..0, |e| e.leaves.clone())
    }

    /// Deepest member depth plus one
    pub fn max_depth(&self) -> usize {
        self.entries.iter().map(|e| e.depth + 1).max().unwrap_or(0)
    }
}
