//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use bytes::TryGetError;
use serde::{Deserialize, Serialize};

use crate::packet::consts::PduType;

// Type aliases.
pub type DecodeResult<T> = Result<T, DecodeError>;

// IS-IS message decoding errors.
#[derive(Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum DecodeError {
    IncompletePdu,
    InvalidHeaderLength(u8),
    InvalidIrdpDiscriminator(u8),
    InvalidVersion(u8),
    InvalidIdLength(u8),
    UnknownPduType(u8),
    UnsupportedPduType(PduType),
    InvalidPduLength(u16),
    InvalidTlvLength(u8),
    // TLVs
    InvalidAreaAddrLen(u8),
    InvalidNumSystemIds(u8),
}

// ===== impl DecodeError =====

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::IncompletePdu => {
                write!(f, "incomplete PDU")
            }
            DecodeError::InvalidHeaderLength(hdr_len) => {
                write!(f, "invalid header length: {}", hdr_len)
            }
            DecodeError::InvalidIrdpDiscriminator(discriminator) => {
                write!(f, "invalid IDRP discriminator: {}", discriminator)
            }
            DecodeError::InvalidVersion(version) => {
                write!(f, "invalid version: {}", version)
            }
            DecodeError::InvalidIdLength(id_len) => {
                write!(f, "invalid ID length: {}", id_len)
            }
            DecodeError::UnknownPduType(pdu_type) => {
                write!(f, "unknown PDU type: {}", pdu_type)
            }
            DecodeError::UnsupportedPduType(pdu_type) => {
                write!(f, "unsupported PDU type: {:?}", pdu_type)
            }
            DecodeError::InvalidPduLength(pdu_len) => {
                write!(f, "invalid PDU length: {}", pdu_len)
            }
            DecodeError::InvalidTlvLength(tlv_len) => {
                write!(f, "invalid TLV length: {}", tlv_len)
            }
            DecodeError::InvalidAreaAddrLen(area_len) => {
                write!(f, "invalid area address length: {}", area_len)
            }
            DecodeError::InvalidNumSystemIds(num) => {
                write!(f, "invalid number of system IDs: {}", num)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<TryGetError> for DecodeError {
    fn from(_error: TryGetError) -> DecodeError {
        DecodeError::IncompletePdu
    }
}
