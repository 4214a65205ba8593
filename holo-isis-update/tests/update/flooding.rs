//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use holo_isis_update::circuit::CircuitType;
use holo_isis_update::flooding::Flag;
use holo_isis_update::packet::pdu::Lsp;

use super::{
    BCAST1, BCAST3, P2P2, circuit, config, flagged, lsp_id, remote_lsp, setup,
    setup_with_circuits,
};

#[test]
fn test_flooding_convergence() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);

    // Newer LSP: flood everywhere except the incoming circuit.
    db.receive_lsp(Some(BCAST1), lsp.clone()).unwrap();
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [P2P2, BCAST3]);
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());

    // Same LSP on a point-to-point circuit: acknowledge it, and stop
    // retransmitting it.
    db.receive_lsp(Some(P2P2), lsp).unwrap();
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);
}

#[test]
fn test_flooding_scenario() {
    let mut db = setup_with_circuits(config());
    let lsp1 = remote_lsp(2, 1, 1200);

    db.receive_lsp(Some(BCAST1), lsp1.clone()).unwrap();
    assert_eq!(db.lsdb().len(), 1);
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [P2P2, BCAST3]);

    // Same content from another circuit.
    db.receive_lsp(Some(P2P2), lsp1).unwrap();
    assert_eq!(db.lsdb().len(), 1);
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);

    // New instance from the first circuit.
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 2, 1200)).unwrap();
    assert_eq!(db.lsdb().len(), 1);
    assert_eq!(db.lsdb().get(&lsp_id(2)).unwrap().data.seqno, 2);
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [P2P2, BCAST3]);
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());
}

#[test]
fn test_flooding_same_broadcast() {
    let mut db = setup_with_circuits(config());
    let lsp = remote_lsp(2, 1, 1200);

    db.receive_lsp(Some(BCAST1), lsp.clone()).unwrap();
    db.receive_lsp(Some(BCAST3), lsp).unwrap();
    assert!(flagged(&db, Flag::Srm, lsp_id(2)).is_empty());
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());
}

#[test]
fn test_flooding_older() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 5, 1200)).unwrap();

    // An older copy is answered with ours.
    db.receive_lsp(Some(BCAST3), remote_lsp(2, 3, 1200)).unwrap();
    assert_eq!(db.lsdb().get(&lsp_id(2)).unwrap().data.seqno, 5);
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST3]);
    assert!(flagged(&db, Flag::Ssn, lsp_id(2)).is_empty());
}

#[test]
fn test_flooding_newer_p2p() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(P2P2), remote_lsp(2, 1, 1200)).unwrap();
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, BCAST3]);
    assert_eq!(flagged(&db, Flag::Ssn, lsp_id(2)), [P2P2]);

    let entry = db.flags().ssn_entry(P2P2, &lsp_id(2)).unwrap();
    assert_eq!(entry.seqno, 1);
    assert_eq!(entry.rem_lifetime, 1200);
}

#[test]
fn test_flooding_confusion() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();

    // Same sequence number but different content.
    let mut lsp = remote_lsp(2, 1, 1200);
    lsp.tlvs.hostname = None;
    lsp.encode();
    db.receive_lsp(Some(BCAST3), lsp).unwrap();

    // The stored copy is purged.
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 1);
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST1, P2P2, BCAST3]);
}

#[test]
fn test_circuit_add_p2p() {
    let mut db = setup(config());
    db.circuit_add(circuit(BCAST1, CircuitType::Broadcast));
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.receive_lsp(Some(BCAST1), remote_lsp(3, 1, 1200)).unwrap();

    // Point-to-point circuits get the whole LSDB.
    db.circuit_add(circuit(P2P2, CircuitType::PointToPoint));
    assert_eq!(db.pending_flags(Flag::Srm, P2P2), [lsp_id(2), lsp_id(3)]);

    // Broadcast circuits rely on CSNPs instead.
    db.circuit_add(circuit(BCAST3, CircuitType::Broadcast));
    assert!(db.pending_flags(Flag::Srm, BCAST3).is_empty());
}

#[test]
fn test_circuit_del() {
    let mut db = setup_with_circuits(config());
    db.receive_lsp(Some(BCAST1), remote_lsp(2, 1, 1200)).unwrap();
    db.circuit_del(P2P2);

    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [BCAST3]);
    assert_eq!(db.circuits().count(), 2);

    // LSPs received on deleted circuits are rejected.
    let result = db.receive_lsp(Some(P2P2), remote_lsp(3, 1, 1200));
    assert!(result.is_err());
    assert!(db.lsdb().get(&lsp_id(3)).is_none());
}

#[test]
fn test_flooding_bytes() {
    let mut db = setup_with_circuits(config());
    let lsp: Lsp = remote_lsp(2, 1, 1200);

    db.receive_lsp_bytes(Some(BCAST1), lsp.raw.clone()).unwrap();
    let lse = db.lsdb().get(&lsp_id(2)).unwrap();
    assert_eq!(lse.data.raw, lsp.raw);
    assert!(lse.is_received());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(2)), [P2P2, BCAST3]);
}
