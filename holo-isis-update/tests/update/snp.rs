//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use holo_isis_update::circuit::CircuitType;
use holo_isis_update::error::Error;
use holo_isis_update::flooding::Flag;
use holo_isis_update::packet::LspId;
use holo_isis_update::packet::tlv::LspEntry;
use tokio::time::Instant;

use super::{
    BCAST1, BCAST3, P2P2, circuit, config, csnp, flagged, lsp_id, psnp,
    remote_lsp, setup, setup_with_circuits,
};

fn entry(id: u8, seqno: u32, rem_lifetime: u16, cksum: u16) -> LspEntry {
    LspEntry {
        rem_lifetime,
        lsp_id: lsp_id(id),
        seqno,
        cksum,
    }
}

#[test]
fn test_psnp_ack() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);
    db.receive_lsp(Some(BCAST1), lsp.clone()).unwrap();
    assert!(db.flag_is_set(Flag::Srm, P2P2, &lsp_id(2)));

    // Acknowledgment received on a point-to-point circuit.
    db.receive_snp(P2P2, psnp([lsp.as_snp_entry()])).unwrap();
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST3]);

    // Broadcast circuits rely on CSNPs.
    db.receive_snp(BCAST3, psnp([lsp.as_snp_entry()])).unwrap();
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST3]);
}

#[test]
fn test_psnp_older() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(P2P2), remote_lsp(2, 5, 1200)).unwrap();
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);

    // The neighbor has an older copy: send ours.
    db.receive_snp(P2P2, psnp([entry(2, 3, 1200, 0x1234)]))
        .unwrap();
    assert!(db.flag_is_set(Flag::Srm, P2P2, &lsp_id(2)));
    assert!(!db.flag_is_set(Flag::Ssn, P2P2, &lsp_id(2)));
}

#[test]
fn test_psnp_newer() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 5, 1200)).unwrap();

    // The neighbor has a newer copy: request it.
    db.receive_snp(P2P2, psnp([entry(2, 7, 1200, 0x1234)]))
        .unwrap();
    assert!(!db.flag_is_set(Flag::Srm, P2P2, &lsp_id(2)));
    let ssn = db.flags().ssn_entry(P2P2, &lsp_id(2)).unwrap();
    assert_eq!(ssn.seqno, 5);

    db.receive_snp(BCAST3, psnp([entry(2, 7, 1200, 0x1234)]))
        .unwrap();
    assert!(db.flag_is_set(Flag::Srm, BCAST3, &lsp_id(2)));
    assert!(db.flag_is_set(Flag::Ssn, BCAST3, &lsp_id(2)));
}

#[test]
fn test_psnp_confusion() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);
    db.receive_lsp(Some(BCAST1), lsp.clone()).unwrap();

    let mut entry = lsp.as_snp_entry();
    entry.cksum = lsp.cksum.wrapping_add(1);
    db.receive_snp(P2P2, psnp([entry])).unwrap();

    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2, BCAST3]);
}

#[tokio::test(start_paused = true)]
async fn test_psnp_unknown() {
    let mut db = setup_with_circuits(config());

    // Entries with a zero field are ignored.
    db.receive_snp(BCAST1, psnp([entry(3, 1, 1200, 0)])).unwrap();
    db.receive_snp(BCAST1, psnp([entry(4, 1, 0, 0x1234)])).unwrap();
    assert!(db.lsdb().is_empty());

    // Unknown LSP: create a placeholder and request the LSP.
    db.receive_snp(BCAST1, psnp([entry(2, 3, 1000, 0x1234)]))
        .unwrap();
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_placeholder());
    assert!(!lse.is_purged());
    assert!(db.lsp_payload(&lsp_id(2)).is_none());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [BCAST1]);
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());

    // Placeholders don't live longer than two minutes.
    tokio::time::advance(Duration::from_secs(119)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    db.process_timers(Instant::now());
    assert!(db.lsdb().get(&lsp_id(2)).is_none());
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());
}

#[test]
fn test_psnp_placeholder_replaced() {
    let mut db = setup_with_circuits(config());
    db.receive_snp(BCAST1, psnp([entry(2, 3, 1000, 0x1234)]))
        .unwrap();

    // The requested LSP finally arrives.
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 3, 1200)).unwrap();
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(!lse.is_placeholder());
    assert_eq!(lse.data.seqno, 3);
    assert!(!db.flag_is_set(Flag::Ssn, BCAST1, &lsp_id(2)));
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [P2P2, BCAST3]);
}

#[test]
fn test_csnp_missing() {
    let mut db = setup(config());
    db.circuit_add(circuit(BCAST1, CircuitType::Broadcast));
    for id in [2, 3, 4] {
        db.receive_lsp(Some(BCAST1), remote_lsp(id, 1, 1200)).unwrap();
    }
    db.circuit_add(circuit(BCAST3, CircuitType::Broadcast));

    // The neighbor only has one of our LSPs.
    let lsp3 = db.snp_entry(&lsp_id(3)).unwrap();
    db.receive_snp(BCAST3, csnp(LspId::MIN, LspId::MAX, [lsp3]))
        .unwrap();
    assert_eq!(
        db.pending_flags(Flag::Srm, BCAST3),
        [lsp_id(2), lsp_id(4)]
    );
}

#[test]
fn test_csnp_range() {
    let mut db = setup(config());
    db.circuit_add(circuit(BCAST1, CircuitType::Broadcast));
    for id in [2, 3, 4] {
        db.receive_lsp(Some(BCAST1), remote_lsp(id, 1, 1200)).unwrap();
    }
    db.purge_lsp(&lsp_id(3)).unwrap();
    db.circuit_add(circuit(BCAST3, CircuitType::Broadcast));

    // LSPs outside the CSNP range and purged LSPs aren't flooded.
    db.receive_snp(BCAST3, csnp(lsp_id(2), lsp_id(3), [])).unwrap();
    assert_eq!(db.pending_flags(Flag::Srm, BCAST3), [lsp_id(2)]);
}

#[test]
fn test_snp_errors() {
    let mut db = setup_with_circuits(config());

    let result = db.receive_snp(BCAST1, csnp(lsp_id(4), lsp_id(2), []));
    assert!(matches!(result, Err(Error::InvalidSnpRange(BCAST1, _, _))));

    let result = db.receive_snp(10, psnp([]));
    assert!(matches!(result, Err(Error::CircuitNotFound(10))));

    // LSPs aren't accepted as SNPs and vice versa.
    let lsp = remote_lsp(2, 1, 1200);
    let result = db.receive_snp_bytes(BCAST1, lsp.raw.clone());
    assert!(matches!(result, Err(Error::UnexpectedPdu(Some(BCAST1), _))));
    let snp = psnp([lsp.as_snp_entry()]).encode();
    let result = db.receive_lsp_bytes(Some(BCAST1), snp);
    assert!(matches!(result, Err(Error::UnexpectedPdu(Some(BCAST1), _))));

    assert!(db.lsdb().is_empty());
}
