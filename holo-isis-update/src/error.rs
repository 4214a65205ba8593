//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use tracing::{error, warn, warn_span};

use crate::circuit::CircuitId;
use crate::packet::consts::PduType;
use crate::packet::error::DecodeError;
use crate::packet::{LevelNumber, LspId};

// IS-IS update process errors.
#[derive(Debug)]
pub enum Error {
    // Inter-task communication
    CircuitNotFound(CircuitId),
    LspNotFound(LevelNumber, LspId),
    UpdateProcessStopped(LevelNumber),
    // Packet input
    PduDecodeError(Option<CircuitId>, DecodeError),
    UnexpectedPdu(Option<CircuitId>, PduType),
    LevelMismatch(Option<CircuitId>, LevelNumber),
    InvalidSnpRange(CircuitId, LspId, LspId),
    ForeignLsp(LspId),
    // Other
    InvalidConfig(serde_json::Error),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::CircuitNotFound(circuit) => {
                warn!(%circuit, "{}", self);
            }
            Error::LspNotFound(level, lsp_id) => {
                warn!(%level, %lsp_id, "{}", self);
            }
            Error::UpdateProcessStopped(level) => {
                error!(%level, "{}", self);
            }
            Error::PduDecodeError(circuit, error) => {
                warn_span!("circuit", id = ?circuit).in_scope(|| {
                    warn!(%error, "{}", self);
                })
            }
            Error::UnexpectedPdu(circuit, pdu_type) => {
                warn_span!("circuit", id = ?circuit).in_scope(|| {
                    warn!(?pdu_type, "{}", self);
                })
            }
            Error::LevelMismatch(circuit, level) => {
                warn_span!("circuit", id = ?circuit).in_scope(|| {
                    warn!(%level, "{}", self);
                })
            }
            Error::InvalidSnpRange(circuit, start, end) => {
                warn_span!("circuit", id = %circuit).in_scope(|| {
                    warn!(%start, %end, "{}", self);
                })
            }
            Error::ForeignLsp(lsp_id) => {
                warn!(%lsp_id, "{}", self);
            }
            Error::InvalidConfig(error) => {
                error!(error = %with_source(error), "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CircuitNotFound(..) => {
                write!(f, "circuit not found")
            }
            Error::LspNotFound(..) => {
                write!(f, "LSP not found")
            }
            Error::UpdateProcessStopped(..) => {
                write!(f, "update process is no longer running")
            }
            Error::PduDecodeError(..) => {
                write!(f, "failed to decode packet")
            }
            Error::UnexpectedPdu(..) => {
                write!(f, "unexpected PDU type")
            }
            Error::LevelMismatch(..) => {
                write!(f, "PDU level mismatch")
            }
            Error::InvalidSnpRange(..) => {
                write!(f, "CSNP start LSP ID is greater than end LSP ID")
            }
            Error::ForeignLsp(..) => {
                write!(f, "self-originated LSP has a foreign System ID")
            }
            Error::InvalidConfig(..) => {
                write!(f, "invalid configuration")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PduDecodeError(_, error) => Some(error),
            Error::InvalidConfig(error) => Some(error),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::InvalidConfig(error)
    }
}

// ===== helper functions =====

fn with_source<E: std::error::Error>(error: E) -> String {
    if let Some(source) = error.source() {
        format!("{} ({})", error, with_source(source))
    } else {
        error.to_string()
    }
}
