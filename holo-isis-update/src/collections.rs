//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::collections::BTreeMap;

use generational_arena::Index;

use crate::lsdb::LspEntry;
use crate::packet::{LanId, LspId, SystemId};

pub type LspEntryIndex = Index;

#[derive(Debug)]
pub struct Arena<T>(generational_arena::Arena<T>);

// Link State Database of a single level.
//
// LSP entries live in a generational arena and are indexed by LSP ID, so
// iteration always follows the LSP ID order.
#[derive(Debug, Default)]
pub struct Lsdb {
    arena: Arena<LspEntry>,
    lspid_tree: BTreeMap<LspId, LspEntryIndex>,
}

// ===== impl Arena =====

impl<T> Default for Arena<T> {
    fn default() -> Arena<T> {
        Arena(Default::default())
    }
}

impl<T> std::ops::Index<Index> for Arena<T> {
    type Output = T;

    fn index(&self, index: Index) -> &Self::Output {
        &self.0[index]
    }
}

impl<T> std::ops::IndexMut<Index> for Arena<T> {
    fn index_mut(&mut self, index: Index) -> &mut Self::Output {
        &mut self.0[index]
    }
}

// ===== impl Lsdb =====

impl Lsdb {
    // Inserts a new LSP entry.
    //
    // Panics if an entry with the same LSP ID already exists.
    pub(crate) fn insert(&mut self, lse: LspEntry) -> &mut LspEntry {
        let lsp_id = lse.data.lsp_id;
        let lse_idx = self.arena.0.insert(lse);
        if self.lspid_tree.insert(lsp_id, lse_idx).is_some() {
            panic!("LSP {} already exists", lsp_id);
        }
        &mut self.arena[lse_idx]
    }

    // Removes the LSP entry corresponding to the given LSP ID.
    pub(crate) fn delete(&mut self, lsp_id: &LspId) -> Option<LspEntry> {
        let lse_idx = self.lspid_tree.remove(lsp_id)?;
        self.arena.0.remove(lse_idx)
    }

    // Removes all LSP entries, returning them in LSP ID order.
    pub(crate) fn drain(&mut self) -> Vec<LspEntry> {
        let lspid_tree = std::mem::take(&mut self.lspid_tree);
        lspid_tree
            .into_values()
            .filter_map(|lse_idx| self.arena.0.remove(lse_idx))
            .collect()
    }

    // Returns a reference to the LSP entry corresponding to the given LSP ID.
    pub fn get(&self, lsp_id: &LspId) -> Option<&LspEntry> {
        self.lspid_tree
            .get(lsp_id)
            .copied()
            .map(|lse_idx| &self.arena[lse_idx])
    }

    // Returns a mutable reference to the LSP entry corresponding to the given
    // LSP ID.
    pub(crate) fn get_mut(&mut self, lsp_id: &LspId) -> Option<&mut LspEntry> {
        let lse_idx = self.lspid_tree.get(lsp_id).copied()?;
        Some(&mut self.arena[lse_idx])
    }

    // Returns an iterator visiting all LSP entries.
    //
    // LSP are ordered by their LSP IDs.
    pub fn iter(&self) -> impl Iterator<Item = &LspEntry> + '_ {
        self.lspid_tree.values().map(|lse_idx| &self.arena[*lse_idx])
    }

    // Returns an iterator visiting all LSP entries for the specified System ID.
    //
    // LSP are ordered by their LSP IDs.
    pub fn iter_for_system_id(
        &self,
        system_id: SystemId,
    ) -> impl Iterator<Item = &LspEntry> + '_ {
        let start = LspId::from((system_id, 0, 0));
        let end = LspId::from((system_id, 255, 255));
        self.range(start..=end)
    }

    // Returns an iterator visiting all LSP entries for the specified LAN ID.
    //
    // LSP are ordered by their LSP IDs.
    pub fn iter_for_lan_id(
        &self,
        lan_id: LanId,
    ) -> impl Iterator<Item = &LspEntry> + '_ {
        let start = LspId::from((lan_id, 0));
        let end = LspId::from((lan_id, 255));
        self.range(start..=end)
    }

    // Returns an iterator over a range of LSP IDs.
    //
    // LSP are ordered by their LSP IDs.
    pub fn range(
        &self,
        range: impl std::ops::RangeBounds<LspId>,
    ) -> impl Iterator<Item = &LspEntry> + '_ {
        self.lspid_tree
            .range(range)
            .map(|(_, lse_idx)| &self.arena[*lse_idx])
    }

    // Returns the number of LSP entries.
    pub fn len(&self) -> usize {
        self.lspid_tree.len()
    }

    // Returns whether the LSDB is empty.
    pub fn is_empty(&self) -> bool {
        self.lspid_tree.is_empty()
    }
}
