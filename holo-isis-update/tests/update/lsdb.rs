//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use holo_isis_update::error::Error;
use holo_isis_update::flooding::Flag;
use holo_isis_update::lsdb::{LspLogReason, LspRecency, lsp_compare};
use holo_isis_update::packet::consts::LspFlags;
use holo_isis_update::packet::pdu::{Lsp, LspTlvs};
use holo_isis_update::packet::tlv::PurgeOriginatorIdTlv;
use holo_isis_update::packet::{LevelNumber, LspId};
use tokio::time::Instant;

use super::{
    BCAST1, BCAST3, P2P2, config, flagged, lsp_id, remote_lsp, remote_purge,
    setup, setup_with_circuits, system_id,
};

//
// Sequence number and lifetime comparison.
//

#[test]
fn test_compare_not_stored() {
    assert_eq!(lsp_compare(None, 1, 1200, None), LspRecency::Newer);
    assert_eq!(lsp_compare(None, 1, 0, None), LspRecency::Newer);
}

#[test]
fn test_compare_totality() {
    let lifetimes = [0, 5, 1200];
    for stored_seqno in 1..=3 {
        for stored_lifetime in lifetimes {
            let stored = remote_lsp(2, stored_seqno, stored_lifetime);

            // Identical header fields.
            assert_eq!(
                lsp_compare(Some(&stored), stored_seqno, stored_lifetime, None),
                LspRecency::Same
            );

            for seqno in 1..=3 {
                for lifetime in lifetimes {
                    let expected = if seqno > stored_seqno {
                        LspRecency::Newer
                    } else if seqno < stored_seqno {
                        LspRecency::Older
                    } else if (stored_lifetime == 0) != (lifetime == 0) {
                        LspRecency::Newer
                    } else {
                        LspRecency::Same
                    };
                    let recency =
                        lsp_compare(Some(&stored), seqno, lifetime, None);
                    assert_eq!(
                        recency, expected,
                        "stored ({}, {}) received ({}, {})",
                        stored_seqno, stored_lifetime, seqno, lifetime
                    );
                }
            }
        }
    }
}

#[test]
fn test_compare_equal_seqno() {
    // A purge wins over a live copy.
    let stored = remote_lsp(2, 3, 5);
    assert_eq!(lsp_compare(Some(&stored), 3, 0, None), LspRecency::Newer);

    // A live copy wins over a purge.
    let stored = remote_lsp(2, 3, 0);
    assert_eq!(lsp_compare(Some(&stored), 3, 5, None), LspRecency::Newer);

    // Differences in the remaining lifetime of live copies don't matter.
    let stored = remote_lsp(2, 3, 1200);
    assert_eq!(lsp_compare(Some(&stored), 3, 5, None), LspRecency::Same);
}

#[test]
fn test_compare_identical_bytes() {
    let stored = remote_lsp(2, 3, 1200);
    let received = remote_lsp(2, 3, 1200);
    assert_eq!(stored.raw, received.raw);
    assert_eq!(
        lsp_compare(Some(&stored), 4, 1200, Some(received.raw.as_ref())),
        LspRecency::Same
    );

    // Different content falls back to the header fields.
    let received = remote_lsp(3, 4, 1200);
    assert_eq!(
        lsp_compare(Some(&stored), 4, 1200, Some(received.raw.as_ref())),
        LspRecency::Newer
    );
}

//
// LSDB contents.
//

#[test]
fn test_lsdb_ordered() {
    let mut db = setup_with_circuits(config());
    for id in [5, 3, 4] {
        db.receive_lsp(Some(BCAST1), remote_lsp(id, 1, 1200)).unwrap();
    }

    let lsp_ids = db
        .lsdb()
        .iter()
        .map(|lse| lse.data.lsp_id)
        .collect::<Vec<_>>();
    assert_eq!(lsp_ids, [lsp_id(3), lsp_id(4), lsp_id(5)]);

    let lsp_ids = db
        .lsdb()
        .range(lsp_id(4)..)
        .map(|lse| lse.data.lsp_id)
        .collect::<Vec<_>>();
    assert_eq!(lsp_ids, [lsp_id(4), lsp_id(5)]);
}

#[test]
fn test_lsp_log() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 2, 1200)).unwrap();

    let log = db.lsp_log().collect::<Vec<_>>();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].lsp.seqno, 2);
    assert_eq!(log[0].reason, LspLogReason::Refresh);
    assert!(log[0].received);
    assert_eq!(log[1].lsp.seqno, 1);
    assert_eq!(log[1].reason, LspLogReason::ContentChange);
}

#[test]
fn test_receive_errors() {
    let mut db = setup_with_circuits(config());

    // Unknown circuit.
    let result = db.receive_lsp(Some(10), remote_lsp(2, 1, 1200));
    assert!(matches!(result, Err(Error::CircuitNotFound(10))));

    // Wrong level.
    let lsp = Lsp::new(
        LevelNumber::L2,
        1200,
        lsp_id(2),
        1,
        LspFlags::IS_TYPE2,
        LspTlvs::default(),
    );
    let result = db.receive_lsp(Some(BCAST1), lsp);
    assert!(matches!(
        result,
        Err(Error::LevelMismatch(Some(BCAST1), LevelNumber::L2))
    ));

    // Self-originated content must carry our System ID.
    let result = db.receive_lsp(None, remote_lsp(2, 1, 1200));
    assert!(matches!(result, Err(Error::ForeignLsp(_))));

    // Malformed PDU.
    let result =
        db.receive_lsp_bytes(Some(BCAST1), bytes::Bytes::from_static(&[0x83]));
    assert!(matches!(result, Err(Error::PduDecodeError(Some(BCAST1), _))));

    assert!(db.lsdb().is_empty());
}

#[test]
fn test_receive_corrupted() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);
    let mut bytes = lsp.raw.to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    db.receive_lsp_bytes(Some(BCAST1), bytes.into()).unwrap();
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
    assert_eq!(db.counters().corrupted_lsps, 1);
    assert!(db.counters().discontinuity_time.is_some());
}

#[test]
fn test_receive_purge_invalid_tlvs() {
    let mut db = setup_with_circuits(config());
    let lsp = Lsp::new(
        LevelNumber::L1,
        0,
        lsp_id(2),
        1,
        LspFlags::IS_TYPE1,
        LspTlvs::new([0xcc], [], None, [], [], []),
    );
    db.receive_lsp(Some(BCAST1), lsp).unwrap();
    assert!(db.lsdb().is_empty());
}

//
// Purges and lifetime.
//

#[test]
fn test_purge_unknown_lsp() {
    let mut db = setup(config());
    let result = db.purge_lsp(&lsp_id(2));
    assert!(matches!(result, Err(Error::LspNotFound(LevelNumber::L1, _))));
}

#[test]
#[should_panic(expected = "already purged")]
fn test_purge_twice() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.purge_lsp(&lsp_id(2)).unwrap();
    let _ = db.purge_lsp(&lsp_id(2));
}

#[tokio::test(start_paused = true)]
async fn test_purge_lifecycle() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.purge_lsp(&lsp_id(2)).unwrap();

    // The purge keeps the sequence number and the hostname.
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 1);
    assert_eq!(lse.data.cksum, 0);
    assert_eq!(lse.data.tlvs.hostname(), Some("rt2"));
    assert_eq!(
        lse.data.tlvs.purge_originator_id,
        Some(PurgeOriginatorIdTlv::new(system_id(1), None))
    );
    assert!(lse.data.tlvs.protocols_supported.is_none());
    assert!(lse.life_timer.is_none());
    assert!(lse.zero_life_timer.is_some());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2, BCAST3]);

    // Kept for ZeroAgeLifetime.
    tokio::time::advance(Duration::from_secs(59)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lifetime_expiry() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 7, 100)).unwrap();

    tokio::time::advance(Duration::from_secs(100)).await;
    db.process_timers(Instant::now());
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 7);
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2, BCAST3]);

    tokio::time::advance(Duration::from_secs(60)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_receive_purge() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.receive_lsp(Some(BCAST3), remote_purge(2, 1)).unwrap();

    // A purge with the same sequence number is newer. Our System ID is
    // recorded as the purge originator.
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert!(lse.is_received());
    assert_eq!(
        lse.data.tlvs.purge_originator_id,
        Some(PurgeOriginatorIdTlv::new(system_id(1), None))
    );
    assert!(lse.data.is_checksum_valid());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2]);

    tokio::time::advance(Duration::from_secs(60)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_receive_purge_unknown() {
    let mut db = setup_with_circuits(config());
    let purge = remote_purge(2, 4);
    db.receive_lsp(Some(P2P2), purge.clone()).unwrap();

    // Recorded as a placeholder that is acknowledged but never flooded.
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_placeholder());
    assert!(lse.is_purged());
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);
    assert_eq!(db.flags().ssn_entry(P2P2, &lsp_id(2)).unwrap().seqno, 4);
    assert!(db.lsp_payload(&lsp_id(2)).is_none());

    tokio::time::advance(Duration::from_secs(60)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());
}

#[test]
fn test_receive_purge_unknown_twice() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(P2P2), remote_purge(2, 4)).unwrap();
    db.receive_lsp(Some(BCAST3), remote_purge(2, 4)).unwrap();

    // The placeholder doesn't make the LSP known.
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_placeholder());
    assert!(lse.is_purged());
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);
}

#[tokio::test(start_paused = true)]
async fn test_receive_purge_after_expiry() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 100)).unwrap();

    // The life timer is due but hasn't been processed yet. The stored copy
    // expires first, and the purge is then the same instance.
    tokio::time::advance(Duration::from_secs(100)).await;
    db.receive_lsp(Some(P2P2), remote_purge(2, 1)).unwrap();
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 1);
    assert!(lse.life_timer.is_none());
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);

    // The canceled life timer doesn't fire.
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).unwrap().is_purged());
    tokio::time::advance(Duration::from_secs(60)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_receive_newer_after_expiry() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 100)).unwrap();

    // Still newer once the stored copy is considered expired.
    tokio::time::advance(Duration::from_secs(100)).await;
    db.receive_lsp(Some(BCAST3), remote_lsp(2, 2, 1200)).unwrap();
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(!lse.is_purged());
    assert_eq!(lse.data.seqno, 2);
    assert!(lse.life_timer.is_some());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2]);

    db.process_timers(Instant::now());
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(!lse.is_purged());
    assert_eq!(lse.data.seqno, 2);
}

#[tokio::test(start_paused = true)]
async fn test_lsp_payload_lifetime() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);
    db.receive_lsp(Some(BCAST1), lsp.clone()).unwrap();

    tokio::time::advance(Duration::from_secs(200)).await;
    let payload = db.lsp_payload(&lsp_id(2)).unwrap();
    assert_eq!(payload[10..12], 1000u16.to_be_bytes());
    assert_eq!(payload[12..], lsp.raw[12..]);
    assert_eq!(db.snp_entry(&lsp_id(2)).unwrap().rem_lifetime, 1000);
    assert!(db.lsp_payload(&LspId::from((system_id(3), 0, 0))).is_none());
}
