//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use holo_utils::UnboundedReceiver;
use holo_utils::task::Task;
use tokio::time::Instant;
use tracing::{Instrument, debug_span};

use crate::debug::Debug;
use crate::packet::LspId;
use crate::tasks::messages::input::{QueryMsg, UpdateMsg};
use crate::update::UpdateDb;

//
// IS-IS update process tasks diagram:
//
//                     +--------------+
//      submit_lsp --> |              |
//      submit_snp --> |              |
//     circuit_add --> |    update    |
//     circuit_del --> |   (1x per    | --> query responses (oneshot)
//      dis_update --> |    level)    |
//    local_update --> |              |
//       purge_own --> |              |
//         queries --> |              |
//                     +--------------+
//                          ^    |
//                          |    | lsp_expiry, lsp_delete,
//                          |    v lsp_refresh, lsp_generate
//                     +--------------+
//                     |  TimerQueue  |
//                     +--------------+
//

// Timer events of the update process.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UpdateTimer {
    // The LSP remaining lifetime reached zero.
    LspExpiry(LspId),
    // The ZeroAgeLifetime of a purged LSP elapsed.
    LspDelete(LspId),
    // A self-originated LSP must be refreshed.
    LspRefresh(LspId),
    // The LSP set of the given pseudonode must be regenerated.
    LspGenerate(u8),
}

// IS-IS update process inter-task message types.
pub mod messages {
    // Input messages (update handle -> update task).
    pub mod input {
        use bytes::Bytes;
        use holo_utils::Responder;

        use crate::circuit::{Circuit, CircuitId, DisState};
        use crate::config::LocalState;
        use crate::flooding::Flag;
        use crate::packet::LspId;
        use crate::packet::tlv::LspEntry;
        use crate::update::UpdateCounters;

        #[derive(Debug)]
        pub enum UpdateMsg {
            LspRx(LspRxMsg),
            SnpRx(SnpRxMsg),
            CircuitAdd(Circuit),
            CircuitDel(CircuitId),
            DisUpdate(DisUpdateMsg),
            LocalUpdate(LocalState),
            PurgeOwn,
            Query(QueryMsg),
            Shutdown,
        }

        #[derive(Debug)]
        pub struct LspRxMsg {
            // `None` for LSPs generated by the local system.
            pub circuit: Option<CircuitId>,
            pub bytes: Bytes,
        }

        #[derive(Debug)]
        pub struct SnpRxMsg {
            pub circuit: CircuitId,
            pub bytes: Bytes,
        }

        #[derive(Debug)]
        pub struct DisUpdateMsg {
            pub pseudonode: u8,
            pub dis: Option<DisState>,
        }

        #[derive(Debug)]
        pub enum QueryMsg {
            LspPayload(LspId, Responder<Option<Bytes>>),
            SnpEntry(LspId, Responder<Option<LspEntry>>),
            Flag(Flag, CircuitId, LspId, Responder<bool>),
            PendingFlags(Flag, CircuitId, Responder<Vec<LspId>>),
            CsnpPage(usize, Responder<Bytes>),
            Counters(Responder<UpdateCounters>),
        }
    }
}

// ===== update task =====

// Spawns the update task of a level.
//
// The task owns the level's state. Messages are processed in arrival order
// and due timers are always processed before the next message.
pub(crate) fn update_task(
    mut db: UpdateDb,
    mut rx: UnboundedReceiver<UpdateMsg>,
) -> Task<()> {
    let span = debug_span!("isis-update", level = %db.level());
    Task::spawn(
        async move {
            Debug::UpdateStart.log();

            loop {
                let deadline = db.next_deadline();
                tokio::select! {
                    _ = sleep_until(deadline) => {
                        db.process_timers(Instant::now());
                    }
                    msg = rx.recv() => {
                        db.process_timers(Instant::now());
                        match msg {
                            Some(UpdateMsg::Shutdown) | None => break,
                            Some(msg) => process_msg(&mut db, msg),
                        }
                    }
                }
            }

            db.stop();
            Debug::UpdateStop.log();
        }
        .instrument(span),
    )
}

fn process_msg(db: &mut UpdateDb, msg: UpdateMsg) {
    let result = match msg {
        UpdateMsg::LspRx(msg) => db.receive_lsp_bytes(msg.circuit, msg.bytes),
        UpdateMsg::SnpRx(msg) => db.receive_snp_bytes(msg.circuit, msg.bytes),
        UpdateMsg::CircuitAdd(circuit) => {
            db.circuit_add(circuit);
            Ok(())
        }
        UpdateMsg::CircuitDel(circuit) => {
            db.circuit_del(circuit);
            Ok(())
        }
        UpdateMsg::DisUpdate(msg) => {
            db.dis_update(msg.pseudonode, msg.dis);
            Ok(())
        }
        UpdateMsg::LocalUpdate(local) => {
            db.local_update(local);
            Ok(())
        }
        UpdateMsg::PurgeOwn => {
            db.purge_own();
            Ok(())
        }
        UpdateMsg::Query(msg) => {
            process_query(db, msg);
            Ok(())
        }
        UpdateMsg::Shutdown => Ok(()),
    };
    if let Err(error) = result {
        error.log();
    }
}

// Answers a query. Requesters that went away are ignored.
fn process_query(db: &mut UpdateDb, msg: QueryMsg) {
    match msg {
        QueryMsg::LspPayload(lsp_id, responder) => {
            let _ = responder.send(db.lsp_payload(&lsp_id));
        }
        QueryMsg::SnpEntry(lsp_id, responder) => {
            let _ = responder.send(db.snp_entry(&lsp_id));
        }
        QueryMsg::Flag(flag, circuit, lsp_id, responder) => {
            let _ = responder.send(db.flag_is_set(flag, circuit, &lsp_id));
        }
        QueryMsg::PendingFlags(flag, circuit, responder) => {
            let _ = responder.send(db.pending_flags(flag, circuit));
        }
        QueryMsg::CsnpPage(idx, responder) => {
            let _ = responder.send(db.csnp_page(idx).pdu.clone());
        }
        QueryMsg::Counters(responder) => {
            let _ = responder.send(db.counters().clone());
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
