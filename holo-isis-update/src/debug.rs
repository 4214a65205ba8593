//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::circuit::{Circuit, CircuitId, DisState};
use crate::packet::pdu::{Lsp, Pdu};
use crate::packet::{LevelNumber, LspId};

// IS-IS update process debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    // Update process
    UpdateStart,
    UpdateStop,
    // Circuits
    CircuitAdd(&'a Circuit),
    CircuitDelete(CircuitId),
    DisChange(u8, Option<&'a DisState>),
    // Network
    PduRx(CircuitId, &'a Pdu),
    // Flooding
    LspDiscard(LevelNumber, &'a Lsp, LspDiscardReason),
    LspDeferred(LevelNumber, &'a Lsp),
    LspConfusion(LevelNumber, &'a Lsp),
    // LSDB maintenance
    LspInstall(LevelNumber, &'a Lsp),
    LspOriginate(LevelNumber, &'a Lsp),
    LspPurge(LevelNumber, &'a Lsp, LspPurgeReason),
    LspDelete(LevelNumber, &'a Lsp),
    LspRefresh(LevelNumber, &'a Lsp),
    LspMaxSeqno(LevelNumber, &'a Lsp),
    // CSNP cache
    CsnpCacheInvalidate(LevelNumber, LspId, usize),
    CsnpPageBuild(LevelNumber, usize, LspId, LspId),
    // LSP generation
    GeneratorCreate(LevelNumber, u8),
    GeneratorDelete(LevelNumber, u8),
}

// Reason why a received LSP is being discarded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LspDiscardReason {
    InvalidChecksum,
    InvalidPurgeTlvs,
}

// Reason why an LSP is being purged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LspPurgeReason {
    Expired,
    Removed,
    Confusion,
    Unsupported,
    MaxSeqno,
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::UpdateStart | Debug::UpdateStop => {
                // Parent span(s): isis-update
                debug!("{}", self);
            }
            Debug::CircuitAdd(circuit) => {
                // Parent span(s): isis-update
                debug_span!("circuit", id = %circuit.id).in_scope(|| {
                    debug!(name = %circuit.name, circuit_type = ?circuit.circuit_type, "{}", self);
                })
            }
            Debug::CircuitDelete(circuit) => {
                // Parent span(s): isis-update
                debug_span!("circuit", id = %circuit).in_scope(|| {
                    debug!("{}", self);
                })
            }
            Debug::DisChange(pseudonode, dis) => {
                // Parent span(s): isis-update
                if let Some(dis) = dis {
                    let neighbors = dis.neighbors.iter().join(",");
                    debug!(%pseudonode, circuit = %dis.circuit, elected = %dis.elected, %neighbors, "{}", self);
                } else {
                    debug!(%pseudonode, elected = "none", "{}", self);
                }
            }
            Debug::PduRx(circuit, pdu) => {
                // Parent span(s): isis-update
                debug_span!("network").in_scope(|| {
                    debug_span!("input").in_scope(|| {
                        let data =
                            serde_json::to_string(&pdu).unwrap_or_default();
                        debug!(%circuit, %data, "{}", self);
                    })
                })
            }
            Debug::LspDiscard(level, lsp, reason) => {
                // Parent span(s): isis-update
                debug!(%level, lsp_id = %lsp.lsp_id, seqno = %lsp.seqno, ?reason, "{}", self);
            }
            Debug::LspDeferred(level, lsp)
            | Debug::LspConfusion(level, lsp)
            | Debug::LspInstall(level, lsp)
            | Debug::LspOriginate(level, lsp)
            | Debug::LspDelete(level, lsp)
            | Debug::LspRefresh(level, lsp)
            | Debug::LspMaxSeqno(level, lsp) => {
                // Parent span(s): isis-update
                debug!(%level, lsp_id = %lsp.lsp_id, seqno = %lsp.seqno, len = %lsp.raw.len(), "{}", self);
            }
            Debug::LspPurge(level, lsp, reason) => {
                // Parent span(s): isis-update
                debug!(%level, lsp_id = %lsp.lsp_id, seqno = %lsp.seqno, len = %lsp.raw.len(), %reason, "{}", self);
            }
            Debug::CsnpCacheInvalidate(level, lsp_id, pages) => {
                // Parent span(s): isis-update
                debug!(%level, %lsp_id, %pages, "{}", self);
            }
            Debug::CsnpPageBuild(level, idx, start, end) => {
                // Parent span(s): isis-update
                debug!(%level, %idx, %start, %end, "{}", self);
            }
            Debug::GeneratorCreate(level, pseudonode)
            | Debug::GeneratorDelete(level, pseudonode) => {
                // Parent span(s): isis-update
                debug!(%level, %pseudonode, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::UpdateStart => {
                write!(f, "starting update process")
            }
            Debug::UpdateStop => {
                write!(f, "stopping update process")
            }
            Debug::CircuitAdd(..) => {
                write!(f, "circuit added")
            }
            Debug::CircuitDelete(..) => {
                write!(f, "circuit deleted")
            }
            Debug::DisChange(..) => {
                write!(f, "DIS change")
            }
            Debug::PduRx(..) => {
                write!(f, "PDU")
            }
            Debug::LspDiscard(..) => {
                write!(f, "discarding LSP")
            }
            Debug::LspDeferred(..) => {
                write!(f, "deferring self-originated LSP until DIS election")
            }
            Debug::LspConfusion(..) => {
                write!(f, "LSP confusion detected")
            }
            Debug::LspInstall(..) => {
                write!(f, "installing LSP")
            }
            Debug::LspOriginate(..) => {
                write!(f, "originating LSP")
            }
            Debug::LspPurge(..) => {
                write!(f, "purging LSP")
            }
            Debug::LspDelete(..) => {
                write!(f, "deleting LSP")
            }
            Debug::LspRefresh(..) => {
                write!(f, "refreshing LSP")
            }
            Debug::LspMaxSeqno(..) => {
                write!(f, "LSP sequence number reached its maximum value")
            }
            Debug::CsnpCacheInvalidate(..) => {
                write!(f, "invalidating CSNP cache")
            }
            Debug::CsnpPageBuild(..) => {
                write!(f, "building CSNP page")
            }
            Debug::GeneratorCreate(..) => {
                write!(f, "LSP generator created")
            }
            Debug::GeneratorDelete(..) => {
                write!(f, "LSP generator deleted")
            }
        }
    }
}

// ===== impl LspPurgeReason =====

impl std::fmt::Display for LspPurgeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LspPurgeReason::Expired => {
                write!(f, "LSP has expired")
            }
            LspPurgeReason::Removed => {
                write!(f, "LSP no longer exists")
            }
            LspPurgeReason::Confusion => {
                write!(f, "LSP confusion")
            }
            LspPurgeReason::Unsupported => {
                write!(f, "pseudonode not supported by this system")
            }
            LspPurgeReason::MaxSeqno => {
                write!(f, "maximum sequence number reached")
            }
        }
    }
}
