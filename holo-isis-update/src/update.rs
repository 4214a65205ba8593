//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use holo_utils::timer::TimerQueue;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::circuit::{Circuit, CircuitId, DisState};
use crate::collections::Lsdb;
use crate::config::{InstanceCfg, LocalState};
use crate::csnp::{CsnpCache, CsnpPage, CsnpParams};
use crate::debug::{Debug, LspPurgeReason};
use crate::error::Error;
use crate::events;
use crate::flooding::{Flag, FloodingFlags};
use crate::lsdb::{
    LSP_LOG_MAX_SIZE, LspEntry, LspEntryFlags, LspLogEntry, LspLogId,
    LspLogReason,
};
use crate::originate::LspGenerator;
use crate::packet::pdu::{Lsp, Snp, SnpTlvs};
use crate::packet::tlv::LspEntry as SnpEntry;
use crate::packet::{LanId, LevelNumber, LspId};
use crate::tasks::UpdateTimer;

// Update process state of a single level.
//
// All LSDB mutations of a level go through this structure, which is owned by
// the level's update task.
#[derive(Debug)]
pub struct UpdateDb {
    pub(crate) level: LevelNumber,
    pub(crate) config: Arc<InstanceCfg>,
    pub(crate) local: LocalState,
    pub(crate) lsdb: Lsdb,
    pub(crate) flags: FloodingFlags,
    pub(crate) csnp_cache: CsnpCache,
    pub(crate) circuits: BTreeMap<CircuitId, Circuit>,
    pub(crate) dis: BTreeMap<u8, DisState>,
    pub(crate) generators: BTreeMap<u8, LspGenerator>,
    // Self-originated pseudonode LSPs received before the DIS election
    // outcome was known, keyed by pseudonode ID.
    pub(crate) deferred: BTreeMap<u8, BTreeMap<LspId, (CircuitId, Lsp)>>,
    pub(crate) timers: TimerQueue<UpdateTimer>,
    pub(crate) counters: UpdateCounters,
    pub(crate) lsp_log: VecDeque<LspLogEntry>,
    pub(crate) lsp_log_next_id: u32,
}

// Update process event counters.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct UpdateCounters {
    pub corrupted_lsps: u32,
    pub own_lsp_purge: u32,
    pub seqno_skipped: u32,
    pub max_sequence: u32,
    pub discontinuity_time: Option<DateTime<Utc>>,
}

// ===== impl UpdateDb =====

impl UpdateDb {
    // Creates the update process state for the given level, scheduling the
    // first generation of the non-pseudonode LSP.
    pub fn new(level: LevelNumber, config: Arc<InstanceCfg>) -> UpdateDb {
        let mut db = UpdateDb {
            level,
            local: config.local_state(),
            config,
            lsdb: Default::default(),
            flags: Default::default(),
            csnp_cache: Default::default(),
            circuits: Default::default(),
            dis: Default::default(),
            generators: Default::default(),
            deferred: Default::default(),
            timers: Default::default(),
            counters: Default::default(),
            lsp_log: Default::default(),
            lsp_log_next_id: 0,
        };
        events::generator_create(&mut db, 0);
        db
    }

    // Processes an LSP received on the given circuit, or generated by this
    // system when no circuit is given.
    pub fn receive_lsp(
        &mut self,
        circuit: Option<CircuitId>,
        lsp: Lsp,
    ) -> Result<(), Error> {
        events::process_lsp_rx(self, circuit, lsp)
    }

    // Processes a CSNP or PSNP received on the given circuit.
    pub fn receive_snp(
        &mut self,
        circuit: CircuitId,
        snp: Snp,
    ) -> Result<(), Error> {
        events::process_snp_rx(self, circuit, snp)
    }

    // Decodes and processes a raw LSP.
    pub fn receive_lsp_bytes(
        &mut self,
        circuit: Option<CircuitId>,
        bytes: Bytes,
    ) -> Result<(), Error> {
        events::process_pdu_lsp(self, circuit, bytes)
    }

    // Decodes and processes a raw CSNP or PSNP.
    pub fn receive_snp_bytes(
        &mut self,
        circuit: CircuitId,
        bytes: Bytes,
    ) -> Result<(), Error> {
        events::process_pdu_snp(self, circuit, bytes)
    }

    pub fn circuit_add(&mut self, circuit: Circuit) {
        events::process_circuit_add(self, circuit)
    }

    pub fn circuit_del(&mut self, circuit: CircuitId) {
        events::process_circuit_del(self, circuit)
    }

    // Updates the DIS state of the given pseudonode. `None` means the
    // election outcome is unknown.
    pub fn dis_update(&mut self, pseudonode: u8, dis: Option<DisState>) {
        events::process_dis_update(self, pseudonode, dis)
    }

    pub fn local_update(&mut self, local: LocalState) {
        events::process_local_update(self, local)
    }

    // Purges all self-originated LSPs.
    pub fn purge_own(&mut self) {
        events::process_purge_own(self)
    }

    // Purges the given LSP.
    //
    // Panics if the LSP is already purged.
    pub fn purge_lsp(&mut self, lsp_id: &LspId) -> Result<(), Error> {
        if self.lsdb.get(lsp_id).is_none() {
            return Err(Error::LspNotFound(self.level, *lsp_id));
        }
        events::lsp_purge(self, lsp_id, LspPurgeReason::Removed);
        Ok(())
    }

    // Processes all timers that are due at the given instant.
    //
    // Returns the number of processed timers.
    pub fn process_timers(&mut self, now: Instant) -> usize {
        let mut count = 0;
        while let Some((timer_id, event)) = self.timers.pop_expired(now) {
            events::process_timer(self, timer_id, event);
            count += 1;
        }
        count
    }

    // Returns the deadline of the next pending timer.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    // Returns a copy of the given LSP, with its current remaining lifetime.
    //
    // Zero sequence number placeholders have no content to send.
    pub fn lsp_payload(&self, lsp_id: &LspId) -> Option<Bytes> {
        self.lsdb
            .get(lsp_id)
            .filter(|lse| !lse.is_placeholder())
            .map(|lse| lse.data.raw_with_rem_lifetime(lse.data.rem_lifetime()))
    }

    // Returns the SNP entry describing the given LSP.
    pub fn snp_entry(&self, lsp_id: &LspId) -> Option<SnpEntry> {
        self.lsdb.get(lsp_id).map(|lse| lse.data.as_snp_entry())
    }

    pub fn flag_is_set(
        &self,
        flag: Flag,
        circuit: CircuitId,
        lsp_id: &LspId,
    ) -> bool {
        self.flags.is_set(flag, circuit, lsp_id)
    }

    // Returns the LSPs that have the given flag set on the given circuit.
    pub fn pending_flags(&self, flag: Flag, circuit: CircuitId) -> Vec<LspId> {
        self.flags.iter(flag, circuit).copied().collect()
    }

    // Returns the given CSNP page, building it if necessary.
    pub fn csnp_page(&mut self, idx: usize) -> &CsnpPage {
        let params = self.csnp_params();
        self.csnp_cache.page(&params, &self.lsdb, idx)
    }

    pub fn level(&self) -> LevelNumber {
        self.level
    }

    pub fn config(&self) -> &InstanceCfg {
        &self.config
    }

    pub fn local(&self) -> &LocalState {
        &self.local
    }

    pub fn lsdb(&self) -> &Lsdb {
        &self.lsdb
    }

    pub fn flags(&self) -> &FloodingFlags {
        &self.flags
    }

    pub fn csnp_cache(&self) -> &CsnpCache {
        &self.csnp_cache
    }

    pub fn circuits(&self) -> impl Iterator<Item = &Circuit> {
        self.circuits.values()
    }

    pub fn generators(&self) -> impl Iterator<Item = &LspGenerator> {
        self.generators.values()
    }

    pub fn counters(&self) -> &UpdateCounters {
        &self.counters
    }

    pub fn lsp_log(&self) -> impl Iterator<Item = &LspLogEntry> {
        self.lsp_log.iter()
    }

    // Returns the self-originated LSPs of the given pseudonode waiting for
    // the DIS election outcome.
    pub fn deferred_lsps(&self, pseudonode: u8) -> impl Iterator<Item = &Lsp> {
        self.deferred
            .get(&pseudonode)
            .into_iter()
            .flat_map(|deferred| deferred.values().map(|(_, lsp)| lsp))
    }

    // Returns the number of pending timers.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    // Stops the update process, canceling all pending timers.
    pub fn stop(&mut self) {
        // Timer handles of the removed entries become stale.
        self.timers.clear();
        self.lsdb.drain();
        self.generators.clear();
        self.deferred.clear();
        self.csnp_cache.clear();
    }

    pub(crate) fn is_own(&self, lsp_id: &LspId) -> bool {
        lsp_id.system_id == self.config.system_id
    }

    pub(crate) fn is_point_to_point(&self, circuit: CircuitId) -> bool {
        self.circuits
            .get(&circuit)
            .is_some_and(|circuit| circuit.is_point_to_point())
    }

    pub(crate) fn csnp_params(&self) -> CsnpParams {
        let size = (self.config.lsp_mtu as usize)
            .saturating_sub(Snp::CSNP_HEADER_LEN as usize);
        CsnpParams {
            level: self.level,
            source: LanId::from((self.config.system_id, 0)),
            max_entries: SnpTlvs::max_lsp_entries(size),
        }
    }

    // Installs the provided LSP into the LSDB, replacing any existing copy.
    //
    // Returns the SNP entry of the installed LSP.
    pub(crate) fn install(
        &mut self,
        lsp: Lsp,
        flags: LspEntryFlags,
    ) -> SnpEntry {
        let level = self.level;
        Debug::LspInstall(level, &lsp).log();

        // Invalidate the CSNP pages covering this LSP.
        self.csnp_invalidate(&lsp.lsp_id);

        // Remove old instance of the LSP.
        let mut content_change = true;
        if let Some(mut old_lse) = self.lsdb.delete(&lsp.lsp_id) {
            old_lse.cancel_timers(&mut self.timers);
            content_change = old_lse.data.flags != lsp.flags
                || old_lse.data.tlvs != lsp.tlvs;
        }

        // Add entry to LSP log.
        let received = flags.contains(LspEntryFlags::RECEIVED);
        let reason = if content_change {
            LspLogReason::ContentChange
        } else {
            LspLogReason::Refresh
        };
        let log_id = LspLogId::new(lsp.lsp_id, lsp.seqno);
        self.lsp_log_add(log_id, received, reason);

        // Arm lifetime timers. Live self-originated LSPs are also refreshed
        // periodically.
        let own = !received && self.is_own(&lsp.lsp_id);
        let mut lse = LspEntry::new(lsp, flags);
        lse.arm_lifetime_timer(&mut self.timers, &self.config);
        if own && !lse.is_purged() && !lse.is_placeholder() {
            lse.arm_refresh_timer(&mut self.timers, &self.config);
        }
        lse.check_timers();

        let lse = self.lsdb.insert(lse);
        lse.data.as_snp_entry()
    }

    // Removes the given LSP from the LSDB.
    pub(crate) fn remove(&mut self, lsp_id: &LspId) -> Option<LspEntry> {
        self.csnp_invalidate(lsp_id);
        let mut lse = self.lsdb.delete(lsp_id)?;
        lse.cancel_timers(&mut self.timers);
        self.flags.remove_lsp(lsp_id);
        Some(lse)
    }

    pub(crate) fn csnp_invalidate(&mut self, lsp_id: &LspId) {
        let pages = self.csnp_cache.invalidate(lsp_id);
        if pages > 0 {
            Debug::CsnpCacheInvalidate(self.level, *lsp_id, pages).log();
        }
    }

    pub(crate) fn counters_touch(&mut self) {
        self.counters.discontinuity_time = Some(Utc::now());
    }

    // Adds log entry for the newly installed LSP.
    fn lsp_log_add(
        &mut self,
        lsp: LspLogId,
        received: bool,
        reason: LspLogReason,
    ) {
        // Get next log ID.
        self.lsp_log_next_id = self.lsp_log_next_id.wrapping_add(1);

        // Add new log entry.
        let log_entry = LspLogEntry::new(
            self.lsp_log_next_id,
            self.level,
            lsp,
            Utc::now(),
            received,
            reason,
        );
        self.lsp_log.push_front(log_entry);

        // Remove old entries if necessary.
        self.lsp_log.truncate(LSP_LOG_MAX_SIZE);
    }
}
