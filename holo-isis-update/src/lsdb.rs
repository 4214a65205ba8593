//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use derive_new::new;
use holo_utils::timer::{Holdtimer, TimerQueue};
use serde::{Deserialize, Serialize};

use crate::config::InstanceCfg;
use crate::packet::pdu::Lsp;
use crate::packet::{LevelNumber, LspId};
use crate::tasks::UpdateTimer;

// Maximum size of the LSP log record.
pub const LSP_LOG_MAX_SIZE: usize = 64;

// LSP database entry.
#[derive(Debug)]
pub struct LspEntry {
    // LSP data.
    pub data: Lsp,
    // Timer triggered when the LSP's remaining lifetime reaches zero.
    pub life_timer: Option<Holdtimer>,
    // Timer triggered when the LSP's ZeroAge timeout expires.
    pub zero_life_timer: Option<Holdtimer>,
    // Timer for the periodic LSP refresh interval (own LSPs only).
    pub refresh_timer: Option<Holdtimer>,
    // LSP entry flags.
    pub flags: LspEntryFlags,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct LspEntryFlags: u8 {
        const RECEIVED = 0x01;
    }
}

// How recent an incoming LSP is compared to the stored copy.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LspRecency {
    Newer,
    Same,
    Older,
}

#[derive(Clone, Debug)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LspLogEntry {
    pub id: u32,
    pub level: LevelNumber,
    pub lsp: LspLogId,
    pub time: DateTime<Utc>,
    pub received: bool,
    pub reason: LspLogReason,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(new)]
#[derive(Deserialize, Serialize)]
pub struct LspLogId {
    pub lsp_id: LspId,
    pub seqno: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum LspLogReason {
    Refresh,
    ContentChange,
}

// ===== impl LspEntry =====

impl LspEntry {
    pub(crate) fn new(data: Lsp, flags: LspEntryFlags) -> LspEntry {
        LspEntry {
            data,
            life_timer: None,
            zero_life_timer: None,
            refresh_timer: None,
            flags,
        }
    }

    // Returns whether the LSP was received from the network.
    pub fn is_received(&self) -> bool {
        self.flags.contains(LspEntryFlags::RECEIVED)
    }

    // Returns whether the LSP is in the purged state.
    pub fn is_purged(&self) -> bool {
        self.data.rem_lifetime == 0
    }

    // Returns whether this is a zero sequence number placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.data.seqno == 0
    }

    // Arms either the life timer or the zero-life timer, depending on the
    // remaining lifetime of the LSP. Previous timers are canceled.
    pub(crate) fn arm_lifetime_timer(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
        config: &InstanceCfg,
    ) {
        self.cancel_lifetime_timers(timers);

        let lsp_id = self.data.lsp_id;
        if self.data.rem_lifetime != 0 {
            let mut lifetime = self.data.rem_lifetime;
            if self.is_placeholder() {
                lifetime = lifetime.min(config.placeholder_lifetime);
            }
            let timeout = Duration::from_secs(lifetime.into());
            let event = UpdateTimer::LspExpiry(lsp_id);
            self.life_timer = Some(timers.schedule(timeout, event));
        } else {
            let timeout = config.zero_age_timeout();
            let event = UpdateTimer::LspDelete(lsp_id);
            self.zero_life_timer = Some(timers.schedule(timeout, event));
        }
    }

    // Arms the refresh timer of a self-originated LSP.
    pub(crate) fn arm_refresh_timer(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
        config: &InstanceCfg,
    ) {
        self.cancel_refresh_timer(timers);

        let lsp_id = self.data.lsp_id;
        let timeout = config.lsp_refresh_interval();
        let event = UpdateTimer::LspRefresh(lsp_id);
        self.refresh_timer = Some(timers.schedule(timeout, event));
    }

    pub(crate) fn cancel_lifetime_timers(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
    ) {
        if let Some(timer) = self.life_timer.take() {
            timers.cancel(&timer);
        }
        if let Some(timer) = self.zero_life_timer.take() {
            timers.cancel(&timer);
        }
    }

    pub(crate) fn cancel_refresh_timer(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
    ) {
        if let Some(timer) = self.refresh_timer.take() {
            timers.cancel(&timer);
        }
    }

    pub(crate) fn cancel_timers(
        &mut self,
        timers: &mut TimerQueue<UpdateTimer>,
    ) {
        self.cancel_lifetime_timers(timers);
        self.cancel_refresh_timer(timers);
    }

    // Checks that exactly one of the life and zero-life timers is armed.
    pub(crate) fn check_timers(&self) {
        assert!(
            self.life_timer.is_some() != self.zero_life_timer.is_some(),
            "LSP {}: inconsistent lifetime timers (life: {}, zero-life: {})",
            self.data.lsp_id,
            self.life_timer.is_some(),
            self.zero_life_timer.is_some(),
        );
    }
}

// ===== global functions =====

// Compares an incoming LSP (or LSP entry) against the stored copy.
//
// When the raw data of both LSPs is available and identical, they're the same
// regardless of anything else.
pub fn lsp_compare(
    stored: Option<&Lsp>,
    seqno: u32,
    rem_lifetime: u16,
    raw: Option<&[u8]>,
) -> LspRecency {
    let Some(stored) = stored else {
        return LspRecency::Newer;
    };
    if raw.is_some_and(|raw| !stored.raw.is_empty() && stored.raw == raw) {
        return LspRecency::Same;
    }
    lsp_compare_fields(stored.seqno, stored.rem_lifetime, seqno, rem_lifetime)
}

// Compares sequence numbers and remaining lifetimes only.
pub(crate) fn lsp_compare_fields(
    stored_seqno: u32,
    stored_rem_lifetime: u16,
    seqno: u32,
    rem_lifetime: u16,
) -> LspRecency {
    if seqno > stored_seqno {
        return LspRecency::Newer;
    }
    if seqno < stored_seqno {
        return LspRecency::Older;
    }

    // ISO 10589 - Section 7.3.16.4.b.1:
    // With equal sequence numbers, a purge is newer than a live LSP.
    if stored_rem_lifetime != 0 && rem_lifetime == 0 {
        return LspRecency::Newer;
    }

    // A live LSP with the same sequence number as a purged copy is accepted
    // as a re-advertisement.
    if stored_rem_lifetime == 0 && rem_lifetime != 0 {
        return LspRecency::Newer;
    }

    LspRecency::Same
}
