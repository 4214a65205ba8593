//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use holo_utils::task::Task;
use holo_utils::{Responder, UnboundedSender};
use tokio::sync::{mpsc, oneshot};
use tracing::{Instrument, debug_span};

use crate::circuit::{Circuit, CircuitId, DisState};
use crate::config::{InstanceCfg, LocalState};
use crate::error::Error;
use crate::flooding::Flag;
use crate::packet::tlv::LspEntry;
use crate::packet::{LevelNumber, Levels, LspId};
use crate::tasks;
use crate::tasks::messages::input::{
    DisUpdateMsg, LspRxMsg, QueryMsg, SnpRxMsg, UpdateMsg,
};
use crate::update::{UpdateCounters, UpdateDb};

// Maximum time to wait for an update task to finish once asked to stop.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

// IS-IS update process instance, running one update task per enabled level.
#[derive(Debug)]
pub struct Instance {
    pub config: Arc<InstanceCfg>,
    pub levels: Levels<Option<UpdateHandle>>,
}

// Handle to the update task of a level.
//
// All requests are processed by the task in the order they were submitted.
#[derive(Debug)]
pub struct UpdateHandle {
    level: LevelNumber,
    tx: UnboundedSender<UpdateMsg>,
    task: Task<()>,
}

// ===== impl Instance =====

impl Instance {
    // Starts the update tasks of all levels enabled in the configuration.
    pub fn start(config: InstanceCfg) -> Instance {
        let config = Arc::new(config);
        let span = debug_span!("instance", system_id = %config.system_id);
        let _span_guard = span.enter();

        let mut levels = Levels::<Option<UpdateHandle>>::default();
        for level in config.level_type {
            *levels.get_mut(level) =
                Some(UpdateHandle::spawn(level, config.clone()));
        }

        Instance { config, levels }
    }

    // Returns the update handle of the given level, if enabled.
    pub fn level(&self, level: LevelNumber) -> Option<&UpdateHandle> {
        self.levels.get(level).as_ref()
    }

    // Stops the update tasks of all levels.
    pub async fn shutdown(self) {
        let Instance { levels, .. } = self;
        let Levels { l1, l2 } = levels;
        for handle in [l1, l2].into_iter().flatten() {
            handle.shutdown().await;
        }
    }
}

// ===== impl UpdateHandle =====

impl UpdateHandle {
    // Spawns the update task of the given level.
    pub fn spawn(level: LevelNumber, config: Arc<InstanceCfg>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let span = debug_span!("isis-update", %level);
        let db = span.in_scope(|| UpdateDb::new(level, config));
        let task = tasks::update_task(db, rx);
        UpdateHandle { level, tx, task }
    }

    pub fn level(&self) -> LevelNumber {
        self.level
    }

    // Submits an LSP received on the given circuit, or generated by this
    // system when no circuit is given.
    pub fn submit_lsp(
        &self,
        circuit: Option<CircuitId>,
        bytes: Bytes,
    ) -> Result<(), Error> {
        self.send(UpdateMsg::LspRx(LspRxMsg { circuit, bytes }))
    }

    // Submits a CSNP or PSNP received on the given circuit.
    pub fn submit_snp(
        &self,
        circuit: CircuitId,
        bytes: Bytes,
    ) -> Result<(), Error> {
        self.send(UpdateMsg::SnpRx(SnpRxMsg { circuit, bytes }))
    }

    pub fn circuit_add(&self, circuit: Circuit) -> Result<(), Error> {
        self.send(UpdateMsg::CircuitAdd(circuit))
    }

    pub fn circuit_del(&self, circuit: CircuitId) -> Result<(), Error> {
        self.send(UpdateMsg::CircuitDel(circuit))
    }

    pub fn dis_update(
        &self,
        pseudonode: u8,
        dis: Option<DisState>,
    ) -> Result<(), Error> {
        self.send(UpdateMsg::DisUpdate(DisUpdateMsg { pseudonode, dis }))
    }

    pub fn local_update(&self, local: LocalState) -> Result<(), Error> {
        self.send(UpdateMsg::LocalUpdate(local))
    }

    pub fn purge_own(&self) -> Result<(), Error> {
        self.send(UpdateMsg::PurgeOwn)
    }

    // Returns a copy of the given LSP, with its current remaining lifetime.
    pub async fn copy_lsp_payload(
        &self,
        lsp_id: LspId,
    ) -> Result<Option<Bytes>, Error> {
        self.query(|responder| QueryMsg::LspPayload(lsp_id, responder))
            .await
    }

    // Returns the SNP entry describing the given LSP.
    pub async fn copy_snp_entry(
        &self,
        lsp_id: LspId,
    ) -> Result<Option<LspEntry>, Error> {
        self.query(|responder| QueryMsg::SnpEntry(lsp_id, responder))
            .await
    }

    pub async fn query_flag(
        &self,
        flag: Flag,
        circuit: CircuitId,
        lsp_id: LspId,
    ) -> Result<bool, Error> {
        self.query(|responder| QueryMsg::Flag(flag, circuit, lsp_id, responder))
            .await
    }

    pub async fn pending_flags(
        &self,
        flag: Flag,
        circuit: CircuitId,
    ) -> Result<Vec<LspId>, Error> {
        self.query(|responder| QueryMsg::PendingFlags(flag, circuit, responder))
            .await
    }

    // Returns the encoded CSNP page with the given index. Indexes past the
    // last page wrap around to the first one.
    pub async fn next_csnp_page(&self, idx: usize) -> Result<Bytes, Error> {
        self.query(|responder| QueryMsg::CsnpPage(idx, responder))
            .await
    }

    pub async fn counters(&self) -> Result<UpdateCounters, Error> {
        self.query(QueryMsg::Counters).await
    }

    // Stops the update task, waiting a bounded amount of time for it to
    // finish.
    pub async fn shutdown(self) {
        let level = self.level;
        let _ = self.tx.send(UpdateMsg::Shutdown);
        self.task
            .join_timeout(SHUTDOWN_TIMEOUT)
            .instrument(debug_span!("update-handle", %level))
            .await;
    }

    fn send(&self, msg: UpdateMsg) -> Result<(), Error> {
        self.tx
            .send(msg)
            .map_err(|_| Error::UpdateProcessStopped(self.level))
    }

    async fn query<T>(
        &self,
        msg: impl FnOnce(Responder<T>) -> QueryMsg,
    ) -> Result<T, Error> {
        let (responder_tx, responder_rx) = oneshot::channel();
        self.send(UpdateMsg::Query(msg(responder_tx)))?;
        responder_rx
            .await
            .map_err(|_| Error::UpdateProcessStopped(self.level))
    }
}
