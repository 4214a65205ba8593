//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

pub mod circuit;
pub mod collections;
pub mod config;
pub mod csnp;
pub mod debug;
pub mod error;
pub mod events;
pub mod flooding;
pub mod instance;
pub mod lsdb;
pub mod originate;
pub mod packet;
pub mod tasks;
pub mod update;
