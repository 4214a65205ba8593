//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::time::Duration;

use ipnetwork::{Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::packet::{AreaAddr, LevelType, SystemId};

// Default LSP MTU.
pub const LSP_MTU: u16 = 1492;
// Default LSP lifetime (MaxAge).
pub const LSP_LIFETIME: u16 = 1200;
// ISO 10589 ZeroAgeLifetime.
pub const LSP_ZERO_AGE_LIFETIME: u16 = 60;
// Minimum interval between two generations of the same LSP set.
pub const LSP_MIN_GEN_INTERVAL: u16 = 5;
// Delay before the first generation of the non-pseudonode LSP.
pub const LSP_GEN_DELAY: u16 = 2;
// Delay before the first generation of a pseudonode LSP.
pub const LSP_PSEUDONODE_GEN_DELAY: u16 = 1;
// Upper bound for the lifetime of zero sequence number placeholders.
pub const LSP_PLACEHOLDER_LIFETIME: u16 = 120;

// Update process configuration, shared by both levels.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceCfg {
    pub system_id: SystemId,
    pub level_type: LevelType,
    pub hostname: Option<String>,
    pub area_addrs: Vec<AreaAddr>,
    pub ipv4_addrs: Vec<Ipv4Network>,
    pub ipv6_addrs: Vec<Ipv6Network>,
    pub overload_status: bool,
    pub attached: bool,
    pub lsp_mtu: u16,
    pub lsp_lifetime: u16,
    pub zero_age_lifetime: u16,
    pub lsp_gen_delay: u16,
    pub pseudonode_gen_delay: u16,
    pub lsp_min_gen_interval: u16,
    pub placeholder_lifetime: u16,
    pub purge_originator: bool,
}

// Local system information advertised in the non-pseudonode LSP.
//
// Unlike the rest of the configuration, this can change at runtime.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LocalState {
    pub hostname: Option<String>,
    pub area_addrs: Vec<AreaAddr>,
    pub ipv4_addrs: Vec<Ipv4Network>,
    pub ipv6_addrs: Vec<Ipv6Network>,
    pub overload_status: bool,
    pub attached: bool,
}

// ===== impl InstanceCfg =====

impl InstanceCfg {
    pub fn new(system_id: SystemId) -> Self {
        InstanceCfg {
            system_id,
            ..Default::default()
        }
    }

    // Parses the configuration from its JSON representation.
    pub fn from_json(data: &str) -> Result<Self, Error> {
        serde_json::from_str(data).map_err(Error::InvalidConfig)
    }

    // Returns the initial local state.
    pub fn local_state(&self) -> LocalState {
        LocalState {
            hostname: self.hostname.clone(),
            area_addrs: self.area_addrs.clone(),
            ipv4_addrs: self.ipv4_addrs.clone(),
            ipv6_addrs: self.ipv6_addrs.clone(),
            overload_status: self.overload_status,
            attached: self.attached,
        }
    }

    // Own LSPs are refreshed once three quarters of their lifetime elapsed.
    pub fn lsp_refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.lsp_lifetime) * 3 / 4)
    }

    pub fn zero_age_timeout(&self) -> Duration {
        Duration::from_secs(self.zero_age_lifetime.into())
    }

    pub fn min_gen_interval(&self) -> Duration {
        Duration::from_secs(self.lsp_min_gen_interval.into())
    }

    // Returns the delay before the first generation of the given pseudonode.
    pub fn gen_delay(&self, pseudonode: u8) -> Duration {
        let delay = if pseudonode == 0 {
            self.lsp_gen_delay
        } else {
            self.pseudonode_gen_delay
        };
        Duration::from_secs(delay.into())
    }
}

impl Default for InstanceCfg {
    fn default() -> InstanceCfg {
        InstanceCfg {
            system_id: Default::default(),
            level_type: LevelType::All,
            hostname: None,
            area_addrs: Default::default(),
            ipv4_addrs: Default::default(),
            ipv6_addrs: Default::default(),
            overload_status: false,
            attached: false,
            lsp_mtu: LSP_MTU,
            lsp_lifetime: LSP_LIFETIME,
            zero_age_lifetime: LSP_ZERO_AGE_LIFETIME,
            lsp_gen_delay: LSP_GEN_DELAY,
            pseudonode_gen_delay: LSP_PSEUDONODE_GEN_DELAY,
            lsp_min_gen_interval: LSP_MIN_GEN_INTERVAL,
            placeholder_lifetime: LSP_PLACEHOLDER_LIFETIME,
            purge_originator: true,
        }
    }
}
