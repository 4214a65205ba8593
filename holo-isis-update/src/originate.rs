//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use holo_utils::timer::{Holdtimer, TimerId, TimerQueue};
use tokio::time::Instant;

use crate::circuit::DisState;
use crate::config::LocalState;
use crate::debug::LspPurgeReason;
use crate::events;
use crate::packet::consts::{LspFlags, Nlpid};
use crate::packet::pdu::{Lsp, LspTlvs};
use crate::packet::tlv::ExtIsReach;
use crate::packet::{LanId, LevelNumber, LspId, SystemId};
use crate::tasks::UpdateTimer;
use crate::update::UpdateDb;

// Generator of the LSP set of a pseudonode (0 being the router itself).
#[derive(Debug)]
pub struct LspGenerator {
    pub pseudonode: u8,
    gen_timer: Option<Holdtimer>,
    last_gen: Option<Instant>,
}

// ===== impl LspGenerator =====

impl LspGenerator {
    pub(crate) fn new(pseudonode: u8) -> LspGenerator {
        LspGenerator {
            pseudonode,
            gen_timer: None,
            last_gen: None,
        }
    }

    // Schedules a new generation.
    //
    // Requests are coalesced while a generation is pending, and generations
    // are never closer to each other than the minimum interval.
    pub(crate) fn schedule(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
        delay: Duration,
        min_interval: Duration,
    ) {
        if self.gen_timer.is_some() {
            return;
        }

        let mut delay = delay;
        if let Some(last_gen) = self.last_gen {
            let next_allowed = last_gen + min_interval;
            let wait = next_allowed.saturating_duration_since(Instant::now());
            delay = delay.max(wait);
        }
        let event = UpdateTimer::LspGenerate(self.pseudonode);
        self.gen_timer = Some(timers.schedule(delay, event));
    }

    pub(crate) fn cancel(&mut self, timers: &mut TimerQueue<UpdateTimer>) {
        if let Some(timer) = self.gen_timer.take() {
            timers.cancel(&timer);
        }
    }

    // Consumes the generation timer if it's the one that fired.
    pub(crate) fn take_timer(&mut self, timer_id: TimerId) -> bool {
        if self.gen_timer.as_ref().map(Holdtimer::id) != Some(timer_id) {
            return false;
        }
        self.gen_timer = None;
        true
    }

    pub fn is_scheduled(&self) -> bool {
        self.gen_timer.is_some()
    }

    // Returns when the pending generation is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.gen_timer.as_ref().map(Holdtimer::deadline)
    }

    pub fn last_gen(&self) -> Option<Instant> {
        self.last_gen
    }
}

// ===== global functions =====

// Generates the LSP set of the given pseudonode, feeding every changed
// fragment back into the update process as self-originated.
//
// Fragments that were previously originated but are no longer needed are
// purged.
pub(crate) fn lsp_generate(db: &mut UpdateDb, pseudonode: u8) {
    let lsps = lsp_build(db, pseudonode).unwrap_or_default();

    for lsp in &lsps {
        // Skip fragments whose content didn't change.
        let unchanged = db.lsdb.get(&lsp.lsp_id).is_some_and(|lse| {
            !lse.is_purged()
                && lse.data.flags == lsp.flags
                && lse.data.tlvs == lsp.tlvs
        });
        if unchanged {
            continue;
        }
        events::lsp_originate(db, lsp.clone());
    }

    // Purge fragments that are no longer produced.
    let lan_id = LanId::from((db.config.system_id, pseudonode));
    let stale = db
        .lsdb
        .iter_for_lan_id(lan_id)
        .filter(|lse| !lse.is_purged() && !lse.is_placeholder())
        .map(|lse| lse.data.lsp_id)
        .filter(|lsp_id| !lsps.iter().any(|lsp| lsp.lsp_id == *lsp_id))
        .collect::<Vec<_>>();
    for lsp_id in stale {
        events::lsp_purge(db, &lsp_id, LspPurgeReason::Removed);
    }

    if let Some(generator) = db.generators.get_mut(&pseudonode) {
        generator.last_gen = Some(Instant::now());
    }
}

// Builds the LSP set of the given pseudonode.
//
// Returns `None` when the local system isn't the DIS of the pseudonode.
pub(crate) fn lsp_build(db: &UpdateDb, pseudonode: u8) -> Option<Vec<Lsp>> {
    let tlvs = if pseudonode == 0 {
        lsp_build_tlvs(&db.local, db.level)
    } else {
        let dis = db.dis.get(&pseudonode).filter(|dis| dis.elected)?;
        lsp_build_tlvs_pseudo(db.config.system_id, dis)
    };
    Some(lsp_build_fragments(db, pseudonode, tlvs))
}

fn lsp_build_flags(db: &UpdateDb, lsp_id: LspId) -> LspFlags {
    let mut lsp_flags = LspFlags::default();
    if db.config.level_type.intersects(LevelNumber::L1) {
        lsp_flags.insert(LspFlags::IS_TYPE1);
    }
    if db.config.level_type.intersects(LevelNumber::L2) {
        lsp_flags.insert(LspFlags::IS_TYPE2);
    }
    if lsp_id.pseudonode == 0 && lsp_id.fragment == 0 {
        if db.local.overload_status {
            lsp_flags.insert(LspFlags::OL);
        }
        if db.local.attached {
            lsp_flags.insert(LspFlags::ATT);
        }
    }
    lsp_flags
}

fn lsp_build_tlvs(local: &LocalState, level: LevelNumber) -> LspTlvs {
    let mut protocols_supported = vec![];
    if !local.ipv4_addrs.is_empty() {
        protocols_supported.push(Nlpid::Ipv4 as u8);
    }
    if !local.ipv6_addrs.is_empty() {
        protocols_supported.push(Nlpid::Ipv6 as u8);
    }

    let area_addrs = match level {
        LevelNumber::L1 => vec![],
        LevelNumber::L2 => local.area_addrs.clone(),
    };

    LspTlvs::new(
        protocols_supported,
        area_addrs,
        local.hostname.clone(),
        [],
        local.ipv4_addrs.iter().map(|addr| addr.ip()),
        local.ipv6_addrs.iter().map(|addr| addr.ip()),
    )
}

fn lsp_build_tlvs_pseudo(system_id: SystemId, dis: &DisState) -> LspTlvs {
    let ext_is_reach = dis
        .neighbors
        .iter()
        .map(|neighbor| LanId::from((*neighbor, 0)))
        // Add ourselves.
        .chain(std::iter::once(LanId::from((system_id, 0))))
        .map(|neighbor| ExtIsReach::new(neighbor, 0));

    LspTlvs::new([], [], None, ext_is_reach, [], [])
}

fn lsp_build_fragments(
    db: &UpdateDb,
    pseudonode: u8,
    mut tlvs: LspTlvs,
) -> Vec<Lsp> {
    let max_len = (db.config.lsp_mtu as usize)
        .saturating_sub(Lsp::HEADER_LEN as usize);
    let mut fragments = vec![];
    for frag_id in 0..=255 {
        let Some(tlvs) = tlvs.next_chunk(max_len) else {
            break;
        };

        // The update process increments the stored sequence number.
        let lsp_id = LspId::from((db.config.system_id, pseudonode, frag_id));
        let seqno = db
            .lsdb
            .get(&lsp_id)
            .map(|lse| lse.data.seqno)
            .unwrap_or(0);
        let lsp_flags = lsp_build_flags(db, lsp_id);
        let fragment = Lsp::new(
            db.level,
            db.config.lsp_lifetime,
            lsp_id,
            seqno,
            lsp_flags,
            tlvs,
        );
        fragments.push(fragment);
    }
    fragments
}
