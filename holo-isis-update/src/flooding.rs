//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::circuit::CircuitId;
use crate::packet::LspId;
use crate::packet::tlv::LspEntry;

// LSP flooding flag kinds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Flag {
    // Send Routing Message: the LSP must be (re)transmitted on the circuit.
    Srm,
    // Send Sequence Numbers: the LSP must be acknowledged on the circuit.
    Ssn,
}

// Flooding flags of all circuits of a level.
#[derive(Debug, Default)]
pub struct FloodingFlags {
    circuits: BTreeMap<CircuitId, CircuitFlags>,
}

// Flooding flags of a single circuit.
#[derive(Debug, Default)]
pub struct CircuitFlags {
    srm: BTreeSet<LspId>,
    // SSN entries carry the summary to be sent in the next PSNP.
    ssn: BTreeMap<LspId, LspEntry>,
}

// ===== impl FloodingFlags =====

impl FloodingFlags {
    pub(crate) fn add_circuit(&mut self, circuit: CircuitId) {
        self.circuits.entry(circuit).or_default();
    }

    pub(crate) fn remove_circuit(&mut self, circuit: CircuitId) {
        self.circuits.remove(&circuit);
    }

    // Sets the flag for the given LSP on the given circuit.
    //
    // Flags of unknown circuits are ignored.
    pub(crate) fn set(
        &mut self,
        flag: Flag,
        entry: &LspEntry,
        circuit: CircuitId,
    ) {
        if let Some(flags) = self.circuits.get_mut(&circuit) {
            flags.set(flag, entry);
        }
    }

    pub(crate) fn clear(
        &mut self,
        flag: Flag,
        lsp_id: &LspId,
        circuit: CircuitId,
    ) {
        if let Some(flags) = self.circuits.get_mut(&circuit) {
            flags.clear(flag, lsp_id);
        }
    }

    // Sets the flag on all circuits, except the one specified (if any).
    pub(crate) fn set_all(
        &mut self,
        flag: Flag,
        entry: &LspEntry,
        except: Option<CircuitId>,
    ) {
        for (_, flags) in self
            .circuits
            .iter_mut()
            .filter(|(circuit, _)| Some(**circuit) != except)
        {
            flags.set(flag, entry);
        }
    }

    // Clears the flag on all circuits, except the one specified (if any).
    pub(crate) fn clear_all(
        &mut self,
        flag: Flag,
        lsp_id: &LspId,
        except: Option<CircuitId>,
    ) {
        for (_, flags) in self
            .circuits
            .iter_mut()
            .filter(|(circuit, _)| Some(**circuit) != except)
        {
            flags.clear(flag, lsp_id);
        }
    }

    // Removes every flag of the given LSP.
    pub(crate) fn remove_lsp(&mut self, lsp_id: &LspId) {
        self.clear_all(Flag::Srm, lsp_id, None);
        self.clear_all(Flag::Ssn, lsp_id, None);
    }

    pub fn is_set(
        &self,
        flag: Flag,
        circuit: CircuitId,
        lsp_id: &LspId,
    ) -> bool {
        self.circuits
            .get(&circuit)
            .is_some_and(|flags| flags.is_set(flag, lsp_id))
    }

    // Returns an iterator over the LSPs that have the flag set on the given
    // circuit, in LSP ID order.
    pub fn iter(
        &self,
        flag: Flag,
        circuit: CircuitId,
    ) -> impl Iterator<Item = &LspId> + '_ {
        self.circuits
            .get(&circuit)
            .into_iter()
            .flat_map(move |flags| flags.iter(flag))
    }

    // Returns the summary entry to acknowledge for the given LSP.
    pub fn ssn_entry(
        &self,
        circuit: CircuitId,
        lsp_id: &LspId,
    ) -> Option<&LspEntry> {
        self.circuits
            .get(&circuit)
            .and_then(|flags| flags.ssn.get(lsp_id))
    }
}

// ===== impl CircuitFlags =====

impl CircuitFlags {
    fn set(&mut self, flag: Flag, entry: &LspEntry) {
        match flag {
            // LSPs with a zero sequence number are never flooded.
            Flag::Srm if entry.seqno == 0 => {}
            Flag::Srm => {
                self.srm.insert(entry.lsp_id);
            }
            Flag::Ssn => {
                self.ssn.insert(entry.lsp_id, *entry);
            }
        }
    }

    fn clear(&mut self, flag: Flag, lsp_id: &LspId) {
        match flag {
            Flag::Srm => {
                self.srm.remove(lsp_id);
            }
            Flag::Ssn => {
                self.ssn.remove(lsp_id);
            }
        }
    }

    fn is_set(&self, flag: Flag, lsp_id: &LspId) -> bool {
        match flag {
            Flag::Srm => self.srm.contains(lsp_id),
            Flag::Ssn => self.ssn.contains_key(lsp_id),
        }
    }

    fn iter(&self, flag: Flag) -> Box<dyn Iterator<Item = &LspId> + '_> {
        match flag {
            Flag::Srm => Box::new(self.srm.iter()),
            Flag::Ssn => Box::new(self.ssn.keys()),
        }
    }
}
