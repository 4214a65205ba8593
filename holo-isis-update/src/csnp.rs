//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use bytes::Bytes;

use crate::collections::Lsdb;
use crate::debug::Debug;
use crate::packet::pdu::{Snp, SnpTlvs};
use crate::packet::tlv::LspEntry;
use crate::packet::{LanId, LevelNumber, LspId};

// Cache of prebuilt CSNPs describing the whole LSDB of a level.
//
// Pages are built lazily, in LSP ID order, and cover contiguous LSP ID
// ranges. The last page always ends at the highest possible LSP ID.
#[derive(Debug, Default)]
pub struct CsnpCache {
    pages: Vec<CsnpPage>,
}

#[derive(Clone, Debug)]
pub struct CsnpPage {
    pub start: LspId,
    pub end: LspId,
    pub entries: Vec<LspEntry>,
    pub pdu: Bytes,
}

// Parameters used to build CSNP pages.
#[derive(Clone, Copy, Debug)]
pub struct CsnpParams {
    pub level: LevelNumber,
    pub source: LanId,
    pub max_entries: usize,
}

// ===== impl CsnpCache =====

impl CsnpCache {
    // Returns the page with the given index, building it (and all pages
    // before it) if necessary.
    //
    // Indexes past the last page wrap around to the first one.
    pub(crate) fn page(
        &mut self,
        params: &CsnpParams,
        lsdb: &Lsdb,
        idx: usize,
    ) -> &CsnpPage {
        while idx >= self.pages.len() && !self.is_complete() {
            self.build_next(params, lsdb);
        }

        let idx = if idx < self.pages.len() { idx } else { 0 };
        &self.pages[idx]
    }

    // Discards the page covering the given LSP ID and all pages after it.
    //
    // Returns the number of discarded pages.
    pub(crate) fn invalidate(&mut self, lsp_id: &LspId) -> usize {
        let Some(pos) = self.pages.iter().position(|page| page.end >= *lsp_id)
        else {
            return 0;
        };
        let count = self.pages.len() - pos;
        self.pages.truncate(pos);
        count
    }

    pub(crate) fn clear(&mut self) {
        self.pages.clear();
    }

    // Returns the number of pages currently built.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    // Returns whether the terminal page has already been built.
    pub fn is_complete(&self) -> bool {
        self.pages.last().is_some_and(|page| page.end == LspId::MAX)
    }

    fn build_next(&mut self, params: &CsnpParams, lsdb: &Lsdb) {
        // The new page starts right after the previous one.
        let start = match self.pages.last() {
            Some(page) => page.end.successor().unwrap_or(LspId::MAX),
            None => LspId::MIN,
        };

        // Take as many entries as fit in a single PDU. If there are more LSPs
        // left, the page ends at the last LSP it describes.
        let max_entries = params.max_entries.max(1);
        let mut entries = lsdb
            .range(start..)
            .take(max_entries + 1)
            .map(|lse| lse.data.as_snp_entry())
            .collect::<Vec<_>>();
        let end = if entries.len() > max_entries {
            entries.truncate(max_entries);
            entries[max_entries - 1].lsp_id
        } else {
            LspId::MAX
        };

        Debug::CsnpPageBuild(params.level, self.pages.len(), start, end).log();

        let snp = Snp::new(
            params.level,
            params.source,
            Some((start, end)),
            SnpTlvs::new(entries.iter().copied()),
        );
        self.pages.push(CsnpPage {
            start,
            end,
            entries,
            pdu: snp.encode(),
        });
    }
}
