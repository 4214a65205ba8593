//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use holo_utils::timer::{Holdtimer, TimerId};
use tokio::time::Instant;

use crate::circuit::{Circuit, CircuitId, DisState};
use crate::config::LocalState;
use crate::debug::{Debug, LspDiscardReason, LspPurgeReason};
use crate::error::Error;
use crate::flooding::Flag;
use crate::lsdb::{
    LspEntry, LspEntryFlags, LspRecency, lsp_compare, lsp_compare_fields,
};
use crate::originate::{self, LspGenerator};
use crate::packet::pdu::{Lsp, LspTlvs, Pdu, Snp};
use crate::packet::tlv::PurgeOriginatorIdTlv;
use crate::packet::{LanId, LspId};
use crate::tasks::UpdateTimer;
use crate::update::UpdateDb;

// ===== PDU input =====

pub(crate) fn process_pdu_lsp(
    db: &mut UpdateDb,
    circuit: Option<CircuitId>,
    bytes: Bytes,
) -> Result<(), Error> {
    // Decode PDU.
    let pdu = Pdu::decode(bytes)
        .map_err(|error| Error::PduDecodeError(circuit, error))?;
    if let Some(circuit) = circuit {
        Debug::PduRx(circuit, &pdu).log();
    }

    let pdu_type = pdu.pdu_type();
    match pdu {
        Pdu::Lsp(lsp) => process_lsp_rx(db, circuit, lsp),
        _ => Err(Error::UnexpectedPdu(circuit, pdu_type)),
    }
}

pub(crate) fn process_pdu_snp(
    db: &mut UpdateDb,
    circuit: CircuitId,
    bytes: Bytes,
) -> Result<(), Error> {
    // Decode PDU.
    let pdu = Pdu::decode(bytes)
        .map_err(|error| Error::PduDecodeError(Some(circuit), error))?;
    Debug::PduRx(circuit, &pdu).log();

    let pdu_type = pdu.pdu_type();
    match pdu {
        Pdu::Snp(snp) => process_snp_rx(db, circuit, snp),
        _ => Err(Error::UnexpectedPdu(Some(circuit), pdu_type)),
    }
}

// ===== LSP input =====

pub(crate) fn process_lsp_rx(
    db: &mut UpdateDb,
    circuit: Option<CircuitId>,
    lsp: Lsp,
) -> Result<(), Error> {
    // Discard LSPs of the wrong level.
    if lsp.level() != db.level {
        return Err(Error::LevelMismatch(circuit, lsp.level()));
    }

    match circuit {
        // Self-originated content.
        None => {
            if !db.is_own(&lsp.lsp_id) {
                return Err(Error::ForeignLsp(lsp.lsp_id));
            }
            lsp_originate(db, lsp);
            Ok(())
        }
        // Content received from the network.
        Some(circuit) => {
            if !db.circuits.contains_key(&circuit) {
                return Err(Error::CircuitNotFound(circuit));
            }
            process_lsp_rx_network(db, circuit, lsp);
            Ok(())
        }
    }
}

fn process_lsp_rx_network(db: &mut UpdateDb, circuit: CircuitId, lsp: Lsp) {
    let level = db.level;
    let own = db.is_own(&lsp.lsp_id);

    // Check if we're receiving a purge of a self-originated LSP.
    if lsp.is_expired() && own {
        db.counters.own_lsp_purge += 1;
        db.counters_touch();
    }

    // Validate LSP checksum.
    if !lsp.is_checksum_valid() {
        db.counters.corrupted_lsps += 1;
        db.counters_touch();
        let reason = LspDiscardReason::InvalidChecksum;
        Debug::LspDiscard(level, &lsp, reason).log();
        return;
    }

    // Validate TLVs in the purged LSP.
    if lsp.is_expired() && !lsp.tlvs.valid_purge_tlvs() {
        let reason = LspDiscardReason::InvalidPurgeTlvs;
        Debug::LspDiscard(level, &lsp, reason).log();
        return;
    }

    // Check if this is a self-originated LSP.
    if own && lsp_rx_own(db, circuit, &lsp) {
        return;
    }

    lsp_rx_normal(db, circuit, lsp);
}

// Handles a received LSP that carries our own System ID.
//
// Returns `false` when the LSP should go through the normal update process.
fn lsp_rx_own(db: &mut UpdateDb, circuit: CircuitId, lsp: &Lsp) -> bool {
    let level = db.level;
    let pseudonode = lsp.lsp_id.pseudonode;

    // The non-pseudonode LSP is always supported. Pseudonode LSPs are only
    // supported while we're the DIS of the corresponding circuit.
    let supported = if pseudonode == 0 {
        true
    } else {
        match db.dis.get(&pseudonode) {
            Some(dis) => dis.elected,
            None => {
                // The election outcome isn't known yet. Decide once it is.
                // Only the most recent copy of each LSP is kept.
                Debug::LspDeferred(level, lsp).log();
                let deferred = db.deferred.entry(pseudonode).or_default();
                let pending = deferred.get(&lsp.lsp_id).map(|(_, lsp)| lsp);
                let recency = lsp_compare(
                    pending,
                    lsp.seqno,
                    lsp.rem_lifetime,
                    Some(lsp.raw.as_ref()),
                );
                if recency == LspRecency::Newer {
                    deferred.insert(lsp.lsp_id, (circuit, lsp.clone()));
                }
                return true;
            }
        }
    };

    // Zero sequence number placeholders don't count as a stored copy.
    let stored = db
        .lsdb
        .get(&lsp.lsp_id)
        .filter(|lse| !lse.is_placeholder());
    let recency = lsp_compare(
        stored.map(|lse| &lse.data),
        lsp.seqno,
        lsp.rem_lifetime,
        Some(lsp.raw.as_ref()),
    );
    let stored_purged = stored.map(|lse| lse.is_purged());

    if !supported {
        // Purges of unsupported LSPs are processed normally.
        if lsp.is_expired() {
            return false;
        }
        // Our purge is already in place.
        if stored_purged == Some(true) && recency != LspRecency::Newer {
            return false;
        }
        lsp_force_purge(db, lsp, LspPurgeReason::Unsupported);
        return true;
    }

    if recency != LspRecency::Newer {
        return false;
    }
    match stored_purged {
        // Purge a stray copy that we don't originate anymore.
        None | Some(true) if !lsp.is_expired() => {
            lsp_force_purge(db, lsp, LspPurgeReason::Removed);
            true
        }
        // Jump past the sequence number of the network copy.
        Some(false) => {
            let Some(lse) = db.lsdb.get(&lsp.lsp_id) else {
                return false;
            };
            let mut template = lse.data.clone();
            template.seqno = lsp.seqno;
            db.counters.seqno_skipped += 1;
            db.counters_touch();
            lsp_originate(db, template);
            true
        }
        _ => false,
    }
}

fn lsp_rx_normal(db: &mut UpdateDb, circuit: CircuitId, mut lsp: Lsp) {
    let level = db.level;
    let p2p = db.is_point_to_point(circuit);
    let lsp_id = lsp.lsp_id;
    let stored = db.lsdb.get(&lsp_id);

    // LSP expiration synchronization (ISO 10589 - Section 7.3.16.4.a).
    //
    // Purges of unknown LSPs are recorded as zero sequence number
    // placeholders, which are acknowledged but never flooded. Existing
    // placeholders don't make the LSP known.
    let known = stored.is_some_and(|lse| !lse.is_placeholder());
    if lsp.is_expired() && !known {
        let placeholder = Lsp::new(
            level,
            0,
            lsp_id,
            0,
            Default::default(),
            Default::default(),
        );
        db.install(placeholder, LspEntryFlags::RECEIVED);
        if p2p {
            db.flags.set(Flag::Ssn, &lsp.as_snp_entry(), circuit);
        }
        return;
    }

    let recency = lsp_compare(
        stored.map(|lse| &lse.data),
        lsp.seqno,
        lsp.rem_lifetime,
        Some(lsp.raw.as_ref()),
    );
    match recency {
        LspRecency::Newer => {
            // Stop the life timer of the stored copy. If it can't be stopped,
            // the stored copy has already expired.
            if !lsp_stop_life_timer(db, &lsp) {
                lsp_expire(db, &lsp_id);
                return lsp_rx_normal(db, circuit, lsp);
            }

            // If we receive a purge without a POI TLV and purge originator
            // support is enabled, add a POI TLV containing our System ID.
            if lsp.is_expired()
                && lsp.tlvs.purge_originator_id.is_none()
                && db.config.purge_originator
            {
                lsp.tlvs.purge_originator_id =
                    Some(PurgeOriginatorIdTlv::new(db.config.system_id, None));
                lsp.encode();
            }

            // Store the new LSP, replacing any existing one.
            let entry = db.install(lsp, LspEntryFlags::RECEIVED);

            // Update LSP flooding flags for the incoming circuit.
            db.flags.clear(Flag::Srm, &lsp_id, circuit);
            if p2p {
                db.flags.set(Flag::Ssn, &entry, circuit);
            } else {
                db.flags.clear(Flag::Ssn, &lsp_id, circuit);
            }

            // Update LSP flooding flags for the other circuits.
            db.flags.set_all(Flag::Srm, &entry, Some(circuit));
            db.flags.clear_all(Flag::Ssn, &lsp_id, Some(circuit));
        }
        LspRecency::Same => {
            // LSP confusion handling (ISO 10589 - Section 7.3.16.2).
            if stored.is_some_and(|lse| is_confused(lse, &lsp)) {
                lsp_confusion(db, &lsp_id);
                return;
            }

            db.flags.clear_all(Flag::Srm, &lsp_id, None);
            if p2p {
                db.flags.set(Flag::Ssn, &lsp.as_snp_entry(), circuit);
            }
        }
        LspRecency::Older => {
            let Some(entry) = stored.map(|lse| lse.data.as_snp_entry()) else {
                return;
            };

            // Send our newer copy back.
            db.flags.set(Flag::Srm, &entry, circuit);
            db.flags.clear(Flag::Ssn, &lsp_id, circuit);
            db.flags.clear_all(Flag::Srm, &lsp_id, Some(circuit));
        }
    }
}

// Stops the life timer of the stored copy of the given LSP.
//
// Returns `false` if the timer couldn't be stopped and the received LSP is no
// longer newer than the stored copy once it's considered expired.
fn lsp_stop_life_timer(db: &mut UpdateDb, lsp: &Lsp) -> bool {
    let Some(lse) = db.lsdb.get_mut(&lsp.lsp_id) else {
        return true;
    };
    let Some(timer) = lse.life_timer.take() else {
        return true;
    };
    if db.timers.cancel(&timer) && timer.deadline() > Instant::now() {
        return true;
    }

    // Recompute the comparison with a zero remaining lifetime.
    let recency = lsp_compare_fields(
        lse.data.seqno,
        0,
        lsp.seqno,
        lsp.rem_lifetime,
    );
    recency == LspRecency::Newer
}

// Checks whether two live LSPs with the same sequence number differ.
fn is_confused(lse: &LspEntry, lsp: &Lsp) -> bool {
    !lse.is_purged() && !lsp.is_expired() && lse.data.cksum != lsp.cksum
}

// Two different LSPs share the same sequence number.
fn lsp_confusion(db: &mut UpdateDb, lsp_id: &LspId) {
    let Some(lse) = db.lsdb.get(lsp_id) else {
        return;
    };
    Debug::LspConfusion(db.level, &lse.data).log();

    if lse.is_received() {
        // Treat it as if its Remaining Lifetime had expired.
        lsp_purge(db, lsp_id, LspPurgeReason::Confusion);
    } else {
        // Increase LSP sequence number and regenerate.
        let lsp = lse.data.clone();
        db.counters.seqno_skipped += 1;
        db.counters_touch();
        lsp_originate(db, lsp);
    }
}

// ===== SNP input =====

pub(crate) fn process_snp_rx(
    db: &mut UpdateDb,
    circuit: CircuitId,
    snp: Snp,
) -> Result<(), Error> {
    let level = db.level;
    if !db.circuits.contains_key(&circuit) {
        return Err(Error::CircuitNotFound(circuit));
    }
    if snp.level() != level {
        return Err(Error::LevelMismatch(Some(circuit), snp.level()));
    }
    if let Some((start, end)) = snp.summary {
        if start > end {
            return Err(Error::InvalidSnpRange(circuit, start, end));
        }
    }
    let p2p = db.is_point_to_point(circuit);

    // Iterate over all LSP entries.
    let lsp_entries = snp
        .tlvs
        .lsp_entries()
        .map(|entry| (entry.lsp_id, *entry))
        .collect::<BTreeMap<_, _>>();
    for entry in lsp_entries.values() {
        let Some(lse) = db.lsdb.get(&entry.lsp_id) else {
            // ISO 10589 - Section 7.3.15.2.b.5:
            // "If no database entry exists for the LSP, and the reported
            // Remaining Lifetime, Checksum and Sequence Number fields of the
            // LSP are all non-zero, create an entry with sequence number 0".
            if entry.rem_lifetime != 0 && entry.cksum != 0 && entry.seqno != 0
            {
                let placeholder = Lsp::new(
                    level,
                    entry.rem_lifetime,
                    entry.lsp_id,
                    0,
                    Default::default(),
                    Default::default(),
                );
                let entry = db.install(placeholder, LspEntryFlags::RECEIVED);
                db.flags.set(Flag::Ssn, &entry, circuit);
            }
            continue;
        };

        let stored_entry = lse.data.as_snp_entry();
        let recency = lsp_compare(
            Some(&lse.data),
            entry.seqno,
            entry.rem_lifetime,
            None,
        );
        match recency {
            // LSP confusion handling (ISO 10589 - Section 7.3.16.2).
            LspRecency::Same
                if !lse.is_purged()
                    && entry.rem_lifetime != 0
                    && lse.data.cksum != entry.cksum =>
            {
                lsp_confusion(db, &entry.lsp_id);
            }
            LspRecency::Same => {
                if p2p {
                    db.flags.clear(Flag::Srm, &entry.lsp_id, circuit);
                }
            }
            LspRecency::Older => {
                db.flags.clear(Flag::Ssn, &entry.lsp_id, circuit);
                db.flags.set(Flag::Srm, &stored_entry, circuit);
            }
            LspRecency::Newer => {
                db.flags.set(Flag::Ssn, &stored_entry, circuit);
                if p2p {
                    db.flags.clear(Flag::Srm, &entry.lsp_id, circuit);
                }
            }
        }
    }

    // Complete Sequence Numbers PDU processing.
    //
    // Flood LSPs we have that the neighbor doesn't.
    if let Some((start, end)) = snp.summary {
        let missing = db
            .lsdb
            .range(start..=end)
            .map(|lse| &lse.data)
            .filter(|lsp| !lsp_entries.contains_key(&lsp.lsp_id))
            // Exclude LSPs with zero Remaining Lifetime.
            .filter(|lsp| lsp.rem_lifetime != 0)
            // Exclude LSPs with zero sequence number.
            .filter(|lsp| lsp.seqno != 0)
            .map(|lsp| lsp.as_snp_entry())
            .collect::<Vec<_>>();
        for entry in missing {
            db.flags.set(Flag::Srm, &entry, circuit);
        }
    }

    Ok(())
}

// ===== LSP origination =====

// Installs a new instance of a self-originated LSP and floods it.
//
// The new sequence number is one past the highest of the provided and the
// stored ones.
pub(crate) fn lsp_originate(db: &mut UpdateDb, lsp: Lsp) {
    let level = db.level;
    let lsp_id = lsp.lsp_id;
    let stored = db.lsdb.get(&lsp_id);
    let stored_live = stored.is_some_and(|lse| !lse.is_purged());
    let seqno = lsp
        .seqno
        .max(stored.map(|lse| lse.data.seqno).unwrap_or(0));

    // The sequence number space is exhausted. Purge the LSP and wait for it
    // to age out before starting over.
    if seqno == u32::MAX {
        db.counters.max_sequence += 1;
        db.counters_touch();
        Debug::LspMaxSeqno(level, &lsp).log();
        if stored_live {
            lsp_force_purge(db, &lsp, LspPurgeReason::MaxSeqno);
        }
        return;
    }

    let lsp = Lsp::new(
        level,
        db.config.lsp_lifetime,
        lsp_id,
        seqno + 1,
        lsp.flags,
        lsp.tlvs,
    );
    Debug::LspOriginate(level, &lsp).log();

    let entry = db.install(lsp, LspEntryFlags::empty());
    db.flags.set_all(Flag::Srm, &entry, None);
    db.flags.clear_all(Flag::Ssn, &lsp_id, None);
}

// Floods a purge of an LSP carrying our System ID, using a sequence number no
// lower than the provided copy's.
fn lsp_force_purge(db: &mut UpdateDb, lsp: &Lsp, reason: LspPurgeReason) {
    let level = db.level;
    let seqno = db
        .lsdb
        .get(&lsp.lsp_id)
        .map(|lse| lse.data.seqno)
        .unwrap_or(0)
        .max(lsp.seqno);
    let purge = Lsp::new(
        level,
        0,
        lsp.lsp_id,
        seqno,
        lsp.flags,
        LspTlvs::purge(purge_originator_id(db), None),
    );
    Debug::LspPurge(level, &purge, reason).log();

    let entry = db.install(purge, LspEntryFlags::empty());
    db.flags.set_all(Flag::Srm, &entry, None);
    db.flags.clear_all(Flag::Ssn, &lsp.lsp_id, None);
}

// ===== LSP purge =====

// Purges the given LSP, keeping it in the LSDB for ZeroAgeLifetime.
//
// Panics if the LSP is already purged.
pub(crate) fn lsp_purge(
    db: &mut UpdateDb,
    lsp_id: &LspId,
    reason: LspPurgeReason,
) {
    let level = db.level;
    let Some(lse) = db.lsdb.get(lsp_id) else {
        return;
    };
    assert!(
        lse.zero_life_timer.is_none() && !lse.is_purged(),
        "LSP {}: already purged",
        lsp_id
    );
    Debug::LspPurge(level, &lse.data, reason).log();

    // Remove all existing TLVs, retaining only the LSP header and hostname.
    let flags = lse.flags;
    let mut lsp = lse.data.clone();
    let hostname = lsp.tlvs.hostname.take();
    lsp.rem_lifetime = 0;
    lsp.tlvs = LspTlvs::purge(purge_originator_id(db), hostname);
    lsp.encode();

    let entry = db.install(lsp, flags);
    db.flags.set_all(Flag::Srm, &entry, None);
    db.flags.clear_all(Flag::Ssn, lsp_id, None);
}

// Expires the given LSP. Placeholders are deleted right away.
fn lsp_expire(db: &mut UpdateDb, lsp_id: &LspId) {
    let Some(lse) = db.lsdb.get(lsp_id) else {
        return;
    };
    if lse.is_placeholder() {
        lsp_delete(db, lsp_id);
    } else {
        lsp_purge(db, lsp_id, LspPurgeReason::Expired);
    }
}

// Purges all live self-originated LSPs of the given LAN ID.
fn lsp_purge_lan(db: &mut UpdateDb, lan_id: LanId) {
    let lsp_ids = db
        .lsdb
        .iter_for_lan_id(lan_id)
        .filter(|lse| !lse.is_purged() && !lse.is_placeholder())
        .map(|lse| lse.data.lsp_id)
        .collect::<Vec<_>>();
    for lsp_id in lsp_ids {
        lsp_purge(db, &lsp_id, LspPurgeReason::Removed);
    }
}

fn purge_originator_id(db: &UpdateDb) -> Option<PurgeOriginatorIdTlv> {
    db.config
        .purge_originator
        .then(|| PurgeOriginatorIdTlv::new(db.config.system_id, None))
}

// ===== LSP delete =====

pub(crate) fn lsp_delete(db: &mut UpdateDb, lsp_id: &LspId) {
    let Some(lse) = db.remove(lsp_id) else {
        return;
    };
    Debug::LspDelete(db.level, &lse.data).log();

    // Start over once an exhausted self-originated LSP is gone.
    if db.is_own(lsp_id) && lse.data.seqno == u32::MAX {
        generator_schedule(db, lsp_id.pseudonode, Duration::ZERO);
    }
}

// ===== timers =====

pub(crate) fn process_timer(
    db: &mut UpdateDb,
    timer_id: TimerId,
    event: UpdateTimer,
) {
    match event {
        UpdateTimer::LspExpiry(lsp_id) => {
            process_lsp_expiry(db, timer_id, &lsp_id)
        }
        UpdateTimer::LspDelete(lsp_id) => {
            process_lsp_delete(db, timer_id, &lsp_id)
        }
        UpdateTimer::LspRefresh(lsp_id) => {
            process_lsp_refresh(db, timer_id, &lsp_id)
        }
        UpdateTimer::LspGenerate(pseudonode) => {
            process_lsp_generate(db, timer_id, pseudonode)
        }
    }
}

fn process_lsp_expiry(db: &mut UpdateDb, timer_id: TimerId, lsp_id: &LspId) {
    // Make sure the timer is still the armed one.
    let Some(lse) = db.lsdb.get_mut(lsp_id) else {
        return;
    };
    if lse.life_timer.as_ref().map(Holdtimer::id) != Some(timer_id) {
        return;
    }
    lse.life_timer = None;

    lsp_expire(db, lsp_id);
}

fn process_lsp_delete(db: &mut UpdateDb, timer_id: TimerId, lsp_id: &LspId) {
    // Make sure the timer is still the armed one, and that the LSP wasn't
    // revived in the meantime.
    let Some(lse) = db.lsdb.get_mut(lsp_id) else {
        return;
    };
    if lse.zero_life_timer.as_ref().map(Holdtimer::id) != Some(timer_id)
        || !lse.is_purged()
    {
        return;
    }
    lse.zero_life_timer = None;

    lsp_delete(db, lsp_id);
}

fn process_lsp_refresh(db: &mut UpdateDb, timer_id: TimerId, lsp_id: &LspId) {
    let Some(lse) = db.lsdb.get_mut(lsp_id) else {
        return;
    };
    if lse.refresh_timer.as_ref().map(Holdtimer::id) != Some(timer_id) {
        return;
    }
    lse.refresh_timer = None;

    // Originate new instance of the LSP.
    let lsp = lse.data.clone();
    Debug::LspRefresh(db.level, &lsp).log();
    lsp_originate(db, lsp);
}

fn process_lsp_generate(db: &mut UpdateDb, timer_id: TimerId, pseudonode: u8) {
    let Some(generator) = db.generators.get_mut(&pseudonode) else {
        return;
    };
    if !generator.take_timer(timer_id) {
        return;
    }

    originate::lsp_generate(db, pseudonode);
}

// ===== LSP generators =====

// Creates the generator of the given pseudonode if necessary, scheduling a
// new generation.
pub(crate) fn generator_create(db: &mut UpdateDb, pseudonode: u8) {
    let delay = db.config.gen_delay(pseudonode);
    generator_schedule(db, pseudonode, delay);
}

fn generator_schedule(db: &mut UpdateDb, pseudonode: u8, delay: Duration) {
    let level = db.level;
    let min_interval = db.config.min_gen_interval();
    let generator = db.generators.entry(pseudonode).or_insert_with(|| {
        Debug::GeneratorCreate(level, pseudonode).log();
        LspGenerator::new(pseudonode)
    });
    generator.schedule(&mut db.timers, delay, min_interval);
}

// Removes the generator of the given pseudonode, purging its LSPs.
fn generator_delete(db: &mut UpdateDb, pseudonode: u8) {
    let Some(mut generator) = db.generators.remove(&pseudonode) else {
        return;
    };
    generator.cancel(&mut db.timers);
    Debug::GeneratorDelete(db.level, pseudonode).log();

    let lan_id = LanId::from((db.config.system_id, pseudonode));
    lsp_purge_lan(db, lan_id);
}

// ===== circuit events =====

pub(crate) fn process_circuit_add(db: &mut UpdateDb, circuit: Circuit) {
    Debug::CircuitAdd(&circuit).log();

    let circuit_id = circuit.id;
    let p2p = circuit.is_point_to_point();
    db.flags.add_circuit(circuit_id);
    db.circuits.insert(circuit_id, circuit);

    // Point-to-point circuits don't run CSNP-based synchronization when they
    // come up, so the whole LSDB is flooded.
    if p2p {
        let entries = db
            .lsdb
            .iter()
            .filter(|lse| !lse.is_placeholder())
            .map(|lse| lse.data.as_snp_entry())
            .collect::<Vec<_>>();
        for entry in entries {
            db.flags.set(Flag::Srm, &entry, circuit_id);
        }
    }
}

pub(crate) fn process_circuit_del(db: &mut UpdateDb, circuit: CircuitId) {
    Debug::CircuitDelete(circuit).log();

    db.circuits.remove(&circuit);
    db.flags.remove_circuit(circuit);
    for deferred in db.deferred.values_mut() {
        deferred.retain(|_, (deferred_circuit, _)| {
            *deferred_circuit != circuit
        });
    }
}

pub(crate) fn process_dis_update(
    db: &mut UpdateDb,
    pseudonode: u8,
    dis: Option<DisState>,
) {
    Debug::DisChange(pseudonode, dis.as_ref()).log();

    // The non-pseudonode LSP isn't subject to DIS elections.
    if pseudonode == 0 {
        return;
    }

    match dis {
        Some(dis) if dis.elected => {
            db.dis.insert(pseudonode, dis);
            generator_create(db, pseudonode);
        }
        Some(dis) => {
            db.dis.insert(pseudonode, dis);
            generator_delete(db, pseudonode);
        }
        None => {
            db.dis.remove(&pseudonode);
            generator_delete(db, pseudonode);
        }
    }

    // Re-evaluate the LSPs that were waiting for the election outcome.
    if let Some(deferred) = db.deferred.remove(&pseudonode) {
        for (circuit, lsp) in deferred.into_values() {
            if let Err(error) = process_lsp_rx(db, Some(circuit), lsp) {
                error.log();
            }
        }
    }
}

pub(crate) fn process_local_update(db: &mut UpdateDb, local: LocalState) {
    if db.local == local {
        return;
    }
    db.local = local;
    generator_schedule(db, 0, Duration::ZERO);
}

pub(crate) fn process_purge_own(db: &mut UpdateDb) {
    // Stop pending generations.
    for generator in db.generators.values_mut() {
        generator.cancel(&mut db.timers);
    }

    let lsp_ids = db
        .lsdb
        .iter_for_system_id(db.config.system_id)
        .filter(|lse| !lse.is_purged() && !lse.is_placeholder())
        .map(|lse| lse.data.lsp_id)
        .collect::<Vec<_>>();
    for lsp_id in lsp_ids {
        lsp_purge(db, &lsp_id, LspPurgeReason::Removed);
    }
}
