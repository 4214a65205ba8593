//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use holo_isis_update::circuit::DisState;
use holo_isis_update::config::LocalState;
use holo_isis_update::flooding::Flag;
use holo_isis_update::lsdb::LspLogReason;
use holo_isis_update::packet::consts::LspFlags;
use holo_isis_update::packet::pdu::{Lsp, LspTlvs};
use holo_isis_update::packet::tlv::ExtIsReach;
use holo_isis_update::packet::{LanId, LevelNumber, LspId};
use holo_isis_update::update::UpdateDb;
use maplit::btreeset;
use tokio::time::Instant;

use super::{
    BCAST1, BCAST3, P2P2, config, flagged, lsp_id, setup_with_circuits,
    system_id,
};

// Advances the clock, processing all timers that become due.
async fn advance(db: &mut UpdateDb, secs: u64) {
    tokio::time::advance(Duration::from_secs(secs)).await;
    db.process_timers(Instant::now());
}

fn own_lsp(db: &UpdateDb, lsp_id: LspId) -> &Lsp {
    &db.lsdb().get(&lsp_id).unwrap().data
}

fn network_lsp(lsp_id: LspId, seqno: u32, rem_lifetime: u16) -> Lsp {
    Lsp::new(
        LevelNumber::L1,
        rem_lifetime,
        lsp_id,
        seqno,
        LspFlags::IS_TYPE1,
        LspTlvs::new([], [], Some("old".to_owned()), [], [], []),
    )
}

fn pseudonode_lsp_id(pseudonode: u8) -> LspId {
    LspId::from((system_id(1), pseudonode, 0))
}

#[tokio::test(start_paused = true)]
async fn test_originate_first() {
    let mut db = setup_with_circuits(config());
    assert!(db.lsdb().is_empty());
    assert_eq!(
        db.next_deadline(),
        Some(Instant::now() + Duration::from_secs(2))
    );

    advance(&mut db, 2).await;
    let lse = db.lsdb().get(&lsp_id(1)).unwrap();
    assert!(!lse.is_received());
    assert!(lse.refresh_timer.is_some());
    assert_eq!(lse.data.seqno, 1);
    assert_eq!(lse.data.rem_lifetime, 1200);
    assert_eq!(lse.data.flags, LspFlags::IS_TYPE1);
    assert_eq!(lse.data.tlvs.hostname(), Some("rt1"));
    assert!(lse.data.is_checksum_valid());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(1)), [BCAST1, P2P2, BCAST3]);
    let generator = db.generators().next().unwrap();
    assert_eq!(generator.pseudonode, 0);
    assert!(!generator.is_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_originate_refresh() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 1);

    // Refreshed once three quarters of the lifetime have elapsed.
    advance(&mut db, 899).await;
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 1);
    advance(&mut db, 1).await;
    let lsp = own_lsp(&db, lsp_id(1));
    assert_eq!(lsp.seqno, 2);
    assert_eq!(lsp.rem_lifetime(), 1200);

    let log = db.lsp_log().next().unwrap();
    assert_eq!(log.lsp.seqno, 2);
    assert_eq!(log.reason, LspLogReason::Refresh);
    assert!(!log.received);

    advance(&mut db, 900).await;
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 3);
}

#[tokio::test(start_paused = true)]
async fn test_originate_local_update() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    let local = LocalState {
        hostname: Some("new".to_owned()),
        ipv4_addrs: vec!["10.0.0.1/24".parse().unwrap()],
        overload_status: true,
        ..Default::default()
    };
    db.local_update(local.clone());

    // Generations are at least five seconds apart.
    advance(&mut db, 4).await;
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 1);
    advance(&mut db, 1).await;
    let lsp = own_lsp(&db, lsp_id(1));
    assert_eq!(lsp.seqno, 2);
    assert_eq!(lsp.flags, LspFlags::IS_TYPE1 | LspFlags::OL);
    assert_eq!(lsp.tlvs.hostname(), Some("new"));
    assert_eq!(lsp.tlvs.protocols_supported().collect::<Vec<_>>(), [0xcc]);
    assert_eq!(
        lsp.tlvs.ipv4_addrs().copied().collect::<Vec<_>>(),
        ["10.0.0.1".parse::<std::net::Ipv4Addr>().unwrap()]
    );
    assert!(lsp.tlvs.area_addrs().next().is_none());
    assert_eq!(
        db.lsp_log().next().unwrap().reason,
        LspLogReason::ContentChange
    );

    // Unchanged local state doesn't trigger a new generation.
    db.local_update(local);
    assert!(!db.generators().next().unwrap().is_scheduled());
}

#[tokio::test(start_paused = true)]
async fn test_originate_fragments() {
    let mut config = config();
    config.lsp_mtu = 300;
    config.ipv4_addrs = (1..=100)
        .map(|i| format!("10.0.{}.1/24", i).parse().unwrap())
        .collect();
    let mut db = setup_with_circuits(config);
    advance(&mut db, 2).await;

    // 273 bytes per fragment: Protocols Supported (3), Hostname (5) and the
    // first IPv4 Addresses TLV (254) go into the first one.
    let frag0 = own_lsp(&db, lsp_id(1));
    assert_eq!(frag0.seqno, 1);
    assert_eq!(frag0.tlvs.ipv4_addrs().count(), 63);
    let frag1 = own_lsp(&db, LspId::from((system_id(1), 0, 1)));
    assert_eq!(frag1.seqno, 1);
    assert_eq!(frag1.tlvs.ipv4_addrs().count(), 37);
    assert!(frag1.tlvs.hostname.is_none());
    assert!(frag1.raw.len() <= 300);

    // Fragments no longer needed are purged.
    db.local_update(LocalState {
        hostname: Some("rt1".to_owned()),
        ..Default::default()
    });
    advance(&mut db, 5).await;
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 2);
    let frag1 = db
        .lsdb()
        .get(&LspId::from((system_id(1), 0, 1)))
        .unwrap();
    assert!(frag1.is_purged());
    assert_eq!(frag1.data.seqno, 1);
}

#[tokio::test(start_paused = true)]
async fn test_own_lsp_newer_from_network() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    // A stale instance from a previous incarnation: jump past it, keeping
    // our own content.
    db.receive_lsp(Some(BCAST1), network_lsp(lsp_id(1), 10, 1200))
        .unwrap();
    let lsp = own_lsp(&db, lsp_id(1));
    assert_eq!(lsp.seqno, 11);
    assert_eq!(lsp.tlvs.hostname(), Some("rt1"));
    assert!(!db.lsdb().get(&lsp_id(1)).unwrap().is_received());
    assert_eq!(flagged(&db, Flag::Srm, lsp_id(1)), [BCAST1, P2P2, BCAST3]);
    assert_eq!(db.counters().seqno_skipped, 1);

    // Older copies are answered with ours.
    db.receive_lsp(Some(BCAST3), network_lsp(lsp_id(1), 5, 1200))
        .unwrap();
    assert_eq!(own_lsp(&db, lsp_id(1)).seqno, 11);
    assert_eq!(db.counters().seqno_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_own_lsp_purged_by_network() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    let mut purge = network_lsp(lsp_id(1), 1, 0);
    purge.tlvs = LspTlvs::purge(None, None);
    purge.encode();
    db.receive_lsp(Some(P2P2), purge).unwrap();

    let lse = db.lsdb().get(&lsp_id(1)).unwrap();
    assert!(!lse.is_purged());
    assert_eq!(lse.data.seqno, 2);
    assert_eq!(db.counters().own_lsp_purge, 1);
    assert_eq!(db.counters().seqno_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_own_lsp_unknown_from_network() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    // A fragment we don't originate anymore.
    let frag_id = LspId::from((system_id(1), 0, 1));
    db.receive_lsp(Some(BCAST1), network_lsp(frag_id, 4, 1200))
        .unwrap();
    let lse = db.lsdb().get(&frag_id).unwrap();
    assert!(lse.is_purged());
    assert!(!lse.is_received());
    assert_eq!(lse.data.seqno, 4);
    assert_eq!(flagged(&db, Flag::Srm, frag_id), [BCAST1, P2P2, BCAST3]);

    // Deleted after ZeroAgeLifetime.
    advance(&mut db, 60).await;
    assert!(db.lsdb().get(&frag_id).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_own_lsp_confusion() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    // Same sequence number, different content.
    db.receive_lsp(Some(BCAST1), network_lsp(lsp_id(1), 1, 1200))
        .unwrap();
    let lsp = own_lsp(&db, lsp_id(1));
    assert_eq!(lsp.seqno, 2);
    assert_eq!(lsp.tlvs.hostname(), Some("rt1"));
    assert_eq!(db.counters().seqno_skipped, 1);
}

#[tokio::test(start_paused = true)]
async fn test_own_lsp_max_seqno() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    db.receive_lsp(Some(BCAST1), network_lsp(lsp_id(1), u32::MAX, 1200))
        .unwrap();
    let lse = db.lsdb().get(&lsp_id(1)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, u32::MAX);
    assert_eq!(db.counters().max_sequence, 1);

    // Start over once the purge ages out.
    advance(&mut db, 60).await;
    db.process_timers(Instant::now());
    let lse = db.lsdb().get(&lsp_id(1)).unwrap();
    assert!(!lse.is_purged());
    assert_eq!(lse.data.seqno, 1);
}

#[tokio::test(start_paused = true)]
async fn test_purge_own() {
    let mut db = setup_with_circuits(config());
    advance(&mut db, 2).await;

    db.purge_own();
    assert!(db.lsdb().get(&lsp_id(1)).unwrap().is_purged());
    assert!(db.generators().all(|generator| !generator.is_scheduled()));
}

#[tokio::test(start_paused = true)]
async fn test_pseudonode() {
    let mut db = setup_with_circuits(config());
    let neighbors = btreeset![system_id(3), system_id(2)];
    let dis = DisState::new(BCAST1, true).with_neighbors(neighbors);
    db.dis_update(1, Some(dis));

    advance(&mut db, 1).await;
    let lsp = own_lsp(&db, pseudonode_lsp_id(1));
    assert_eq!(lsp.seqno, 1);
    assert_eq!(
        lsp.tlvs.ext_is_reach().copied().collect::<Vec<_>>(),
        [
            ExtIsReach::new(LanId::from((system_id(2), 0)), 0),
            ExtIsReach::new(LanId::from((system_id(3), 0)), 0),
            ExtIsReach::new(LanId::from((system_id(1), 0)), 0),
        ]
    );
    assert!(lsp.tlvs.hostname.is_none());

    // Losing the election purges the pseudonode LSP.
    db.dis_update(1, Some(DisState::new(BCAST1, false)));
    assert!(db.lsdb().get(&pseudonode_lsp_id(1)).unwrap().is_purged());
    assert!(db.generators().all(|generator| generator.pseudonode == 0));
}

#[tokio::test(start_paused = true)]
async fn test_pseudonode_deferred() {
    let mut db = setup_with_circuits(config());

    // The DIS election hasn't run yet.
    let lsp = network_lsp(pseudonode_lsp_id(2), 3, 1200);
    db.receive_lsp(Some(BCAST1), lsp).unwrap();
    assert!(db.lsdb().get(&pseudonode_lsp_id(2)).is_none());

    // We aren't the DIS: the stray pseudonode LSP is purged.
    db.dis_update(2, Some(DisState::new(BCAST1, false)));
    let lse = db.lsdb().get(&pseudonode_lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 3);
    assert_eq!(
        flagged(&db, Flag::Srm, pseudonode_lsp_id(2)),
        [BCAST1, P2P2, BCAST3]
    );
}

#[test]
fn test_pseudonode_deferred_newest() {
    let mut db = setup_with_circuits(config());

    // Retransmissions don't pile up, only the most recent copy is kept.
    for _ in 0..10 {
        let lsp = network_lsp(pseudonode_lsp_id(2), 3, 1200);
        db.receive_lsp(Some(BCAST1), lsp).unwrap();
    }
    let lsp = network_lsp(pseudonode_lsp_id(2), 5, 1200);
    db.receive_lsp(Some(BCAST3), lsp).unwrap();
    let lsp = network_lsp(pseudonode_lsp_id(2), 4, 1200);
    db.receive_lsp(Some(BCAST1), lsp).unwrap();
    assert_eq!(
        db.deferred_lsps(2).map(|lsp| lsp.seqno).collect::<Vec<_>>(),
        [5]
    );

    db.dis_update(2, Some(DisState::new(BCAST1, false)));
    assert_eq!(db.deferred_lsps(2).count(), 0);
    let lse = db.lsdb().get(&pseudonode_lsp_id(2)).unwrap();
    assert!(lse.is_purged());
    assert_eq!(lse.data.seqno, 5);
}

#[test]
fn test_pseudonode_deferred_circuit_del() {
    let mut db = setup_with_circuits(config());
    let lsp = network_lsp(pseudonode_lsp_id(2), 3, 1200);
    db.receive_lsp(Some(BCAST1), lsp).unwrap();

    // Copies received on a circuit that went away are dropped.
    db.circuit_del(BCAST1);
    assert_eq!(db.deferred_lsps(2).count(), 0);
    db.dis_update(2, Some(DisState::new(BCAST3, false)));
    assert!(db.lsdb().get(&pseudonode_lsp_id(2)).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_pseudonode_deferred_elected() {
    let mut db = setup_with_circuits(config());

    let lsp = network_lsp(pseudonode_lsp_id(2), 3, 1200);
    db.receive_lsp(Some(BCAST1), lsp).unwrap();

    // We're the DIS but haven't generated the LSP yet: purge the stray copy
    // until it's regenerated.
    db.dis_update(2, Some(DisState::new(BCAST1, true)));
    assert!(db.lsdb().get(&pseudonode_lsp_id(2)).unwrap().is_purged());

    advance(&mut db, 1).await;
    let lse = db.lsdb().get(&pseudonode_lsp_id(2)).unwrap();
    assert!(!lse.is_purged());
    assert_eq!(lse.data.seqno, 4);
}
