//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::collections::BTreeSet;

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::packet::SystemId;

// Opaque circuit identifier, assigned by the owner of the circuits.
pub type CircuitId = u32;

// IS-IS circuit types.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitType {
    Broadcast,
    PointToPoint,
}

// Circuit the update process floods on.
//
// Adjacency management is done elsewhere: a circuit is registered once it
// has at least one adjacency in the Up state for the level.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct Circuit {
    pub id: CircuitId,
    pub name: String,
    pub circuit_type: CircuitType,
}

// Outcome of the DIS election for the pseudonode with a given circuit ID.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct DisState {
    // Circuit the pseudonode is attached to.
    pub circuit: CircuitId,
    // Whether the local system is the elected DIS.
    pub elected: bool,
    // Systems with an adjacency in the Up state on the circuit.
    #[new(default)]
    pub neighbors: BTreeSet<SystemId>,
}

// ===== impl Circuit =====

impl Circuit {
    pub fn is_point_to_point(&self) -> bool {
        self.circuit_type == CircuitType::PointToPoint
    }
}

// ===== impl DisState =====

impl DisState {
    pub fn with_neighbors(
        mut self,
        neighbors: impl IntoIterator<Item = SystemId>,
    ) -> Self {
        self.neighbors = neighbors.into_iter().collect();
        self
    }
}
