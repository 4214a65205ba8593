//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//
// Sponsored by NLnet as part of the Next Generation Internet initiative.
// See: https://nlnet.nl/NGI0
//

use std::cell::{RefCell, RefMut};
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use holo_utils::bytes::TLS_BUF;
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::packet::consts::{
    IDRP_DISCRIMINATOR, LspFlags, PduType, SYSTEM_ID_LEN, TlvType, VERSION,
    VERSION_PROTO_EXT,
};
use crate::packet::error::{DecodeError, DecodeResult};
use crate::packet::tlv::{
    AreaAddressesTlv, DynamicHostnameTlv, ExtIsReach, ExtIsReachTlv,
    Ipv4AddressesTlv, Ipv6AddressesTlv, LspEntriesTlv, LspEntry,
    ProtocolsSupportedTlv, PurgeOriginatorIdTlv, TLV_HDR_SIZE, Tlv,
    UnknownTlv, tlv_entries_split, tlv_take_max,
};
use crate::packet::{AreaAddr, LanId, LevelNumber, LspId};

// IS-IS PDUs handled by the update process.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum Pdu {
    Lsp(Lsp),
    Snp(Snp),
}

// IS-IS PDU common header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Header {
    pub pdu_type: PduType,
    pub max_area_addrs: u8,
}

// IS-IS Link State PDU.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Lsp {
    pub hdr: Header,
    pub rem_lifetime: u16,
    pub lsp_id: LspId,
    pub seqno: u32,
    pub cksum: u16,
    pub flags: LspFlags,
    pub tlvs: LspTlvs,
    // Encoded LSP, exactly as received or originated.
    #[serde(skip)]
    pub raw: Bytes,
    // Time the LSP was created or received. When combined with the Remaining
    // Lifetime field, the actual LSP remaining lifetime can be determined.
    #[serde(skip)]
    pub base_time: Option<Instant>,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default)]
pub struct LspTlvs {
    pub protocols_supported: Option<ProtocolsSupportedTlv>,
    pub area_addrs: Vec<AreaAddressesTlv>,
    pub purge_originator_id: Option<PurgeOriginatorIdTlv>,
    pub hostname: Option<DynamicHostnameTlv>,
    pub ext_is_reach: Vec<ExtIsReachTlv>,
    pub ipv4_addrs: Vec<Ipv4AddressesTlv>,
    pub ipv6_addrs: Vec<Ipv6AddressesTlv>,
    pub unknown: Vec<UnknownTlv>,
}

// IS-IS Sequence Numbers PDU (CSNP or PSNP).
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Snp {
    pub hdr: Header,
    pub source: LanId,
    pub summary: Option<(LspId, LspId)>,
    pub tlvs: SnpTlvs,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(default)]
pub struct SnpTlvs {
    pub lsp_entries: Vec<LspEntriesTlv>,
    pub unknown: Vec<UnknownTlv>,
}

// ===== impl Pdu =====

impl Pdu {
    // Decodes IS-IS PDU from a bytes buffer.
    pub fn decode(mut buf: Bytes) -> DecodeResult<Self> {
        let buf_orig = buf.clone();

        // Decode PDU common header.
        let hdr = Header::decode(&mut buf)?;

        // Decode PDU-specific fields.
        let pdu = match hdr.pdu_type {
            PduType::LspL1 | PduType::LspL2 => {
                Pdu::Lsp(Lsp::decode(hdr, &mut buf, buf_orig)?)
            }
            PduType::CsnpL1
            | PduType::CsnpL2
            | PduType::PsnpL1
            | PduType::PsnpL2 => {
                Pdu::Snp(Snp::decode(hdr, &mut buf, buf_orig)?)
            }
            PduType::HelloLanL1 | PduType::HelloLanL2 | PduType::HelloP2P => {
                return Err(DecodeError::UnsupportedPduType(hdr.pdu_type));
            }
        };

        Ok(pdu)
    }

    // Encodes IS-IS PDU into a bytes buffer.
    pub fn encode(&self) -> Bytes {
        match self {
            Pdu::Lsp(pdu) => pdu.raw.clone(),
            Pdu::Snp(pdu) => pdu.encode(),
        }
    }

    // Returns the IS-IS PDU type.
    pub const fn pdu_type(&self) -> PduType {
        match self {
            Pdu::Lsp(pdu) => pdu.hdr.pdu_type,
            Pdu::Snp(pdu) => pdu.hdr.pdu_type,
        }
    }
}

// ===== impl Header =====

impl Header {
    const LEN: u8 = 8;

    pub const fn new(pdu_type: PduType) -> Self {
        Header {
            pdu_type,
            max_area_addrs: 0,
        }
    }

    // Decodes IS-IS PDU header from a bytes buffer.
    pub fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let packet_len = buf.len();

        // Ensure the packet has enough data for the fixed-length IS-IS header.
        if packet_len < Self::LEN as _ {
            return Err(DecodeError::IncompletePdu);
        }

        // Parse IDRP discriminator.
        let idrp_discr = buf.try_get_u8()?;
        if idrp_discr != IDRP_DISCRIMINATOR {
            return Err(DecodeError::InvalidIrdpDiscriminator(idrp_discr));
        }

        // Parse length of fixed header.
        let fixed_header_length = buf.try_get_u8()?;

        // Parse version/protocol ID extension.
        let version_proto_ext = buf.try_get_u8()?;
        if version_proto_ext != VERSION_PROTO_EXT {
            return Err(DecodeError::InvalidVersion(version_proto_ext));
        }

        // Parse ID length.
        let id_len = buf.try_get_u8()?;
        if id_len != 0 && id_len != SYSTEM_ID_LEN {
            return Err(DecodeError::InvalidIdLength(id_len));
        }

        // Parse PDU type.
        let pdu_type = buf.try_get_u8()?;
        let pdu_type = match PduType::from_u8(pdu_type & 0x1f) {
            Some(pdu_type) => pdu_type,
            None => return Err(DecodeError::UnknownPduType(pdu_type)),
        };

        // Additional sanity checks.
        if fixed_header_length != Self::fixed_header_length(pdu_type) {
            return Err(DecodeError::InvalidHeaderLength(fixed_header_length));
        }
        if packet_len < fixed_header_length as _ {
            return Err(DecodeError::IncompletePdu);
        }

        // Parse version.
        let version = buf.try_get_u8()?;
        if version != VERSION {
            return Err(DecodeError::InvalidVersion(version));
        }

        // Parse reserved field.
        let _reserved = buf.try_get_u8()?;

        // Parse maximum area addresses.
        let max_area_addrs = buf.try_get_u8()?;

        Ok(Header {
            pdu_type,
            max_area_addrs,
        })
    }

    // Encodes IS-IS PDU header into a bytes buffer.
    fn encode(&self, buf: &mut BytesMut) {
        // Encode IDRP discriminator.
        buf.put_u8(IDRP_DISCRIMINATOR);
        // Encode length of fixed header.
        buf.put_u8(Self::fixed_header_length(self.pdu_type));
        // Encode version/protocol ID extension.
        buf.put_u8(VERSION_PROTO_EXT);
        // Encode ID length (use default value).
        buf.put_u8(0);
        // Encode PDU type.
        buf.put_u8(self.pdu_type as u8);
        // Encode version.
        buf.put_u8(VERSION);
        // Encode reserved field.
        buf.put_u8(0);
        // Encode maximum area addresses.
        buf.put_u8(self.max_area_addrs);
    }

    // Returns the length of the fixed header for a given PDU type.
    const fn fixed_header_length(pdu_type: PduType) -> u8 {
        match pdu_type {
            PduType::HelloLanL1 | PduType::HelloLanL2 => 27,
            PduType::HelloP2P => 20,
            PduType::LspL1 | PduType::LspL2 => Lsp::HEADER_LEN,
            PduType::CsnpL1 | PduType::CsnpL2 => Snp::CSNP_HEADER_LEN,
            PduType::PsnpL1 | PduType::PsnpL2 => Snp::PSNP_HEADER_LEN,
        }
    }
}

// ===== impl Lsp =====

impl Lsp {
    pub const HEADER_LEN: u8 = 27;
    const REM_LIFETIME_RANGE: std::ops::Range<usize> = 10..12;
    const CKSUM_RANGE: std::ops::Range<usize> = 24..26;
    // Offset of the first byte covered by the checksum (the LSP ID).
    const CKSUM_START: usize = 12;

    pub fn new(
        level: LevelNumber,
        rem_lifetime: u16,
        lsp_id: LspId,
        seqno: u32,
        flags: LspFlags,
        tlvs: LspTlvs,
    ) -> Self {
        let pdu_type = match level {
            LevelNumber::L1 => PduType::LspL1,
            LevelNumber::L2 => PduType::LspL2,
        };
        let mut lsp = Lsp {
            hdr: Header::new(pdu_type),
            rem_lifetime,
            lsp_id,
            seqno,
            cksum: 0,
            flags,
            tlvs,
            raw: Default::default(),
            base_time: Some(Instant::now()),
        };
        lsp.encode();
        lsp
    }

    fn decode(
        hdr: Header,
        buf: &mut Bytes,
        buf_orig: Bytes,
    ) -> DecodeResult<Self> {
        // Parse PDU length.
        let pdu_len = buf.try_get_u16()?;
        if pdu_len as usize != buf_orig.len() {
            return Err(DecodeError::InvalidPduLength(pdu_len));
        }

        // Parse remaining lifetime.
        let rem_lifetime = buf.try_get_u16()?;

        // Parse LSP ID.
        let lsp_id = LspId::decode(buf)?;

        // Parse sequence number.
        let seqno = buf.try_get_u32()?;

        // Parse checksum.
        let cksum = buf.try_get_u16()?;

        // Parse flags.
        let flags = buf.try_get_u8()?;
        let flags = LspFlags::from_bits_truncate(flags);

        // Parse top-level TLVs.
        let mut tlvs = LspTlvs::default();
        while buf.remaining() >= TLV_HDR_SIZE {
            // Parse TLV type.
            let tlv_type = buf.try_get_u8()?;
            let tlv_etype = TlvType::from_u8(tlv_type);

            // Parse and validate TLV length.
            let tlv_len = buf.try_get_u8()?;
            if tlv_len as usize > buf.remaining() {
                return Err(DecodeError::InvalidTlvLength(tlv_len));
            }

            // Parse TLV value.
            let mut buf_tlv = buf.copy_to_bytes(tlv_len as usize);
            match tlv_etype {
                Some(TlvType::AreaAddresses) => {
                    let tlv = AreaAddressesTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.area_addrs.push(tlv);
                }
                Some(TlvType::PurgeOriginatorId) => {
                    if tlvs.purge_originator_id.is_some() {
                        continue;
                    }
                    let tlv =
                        PurgeOriginatorIdTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.purge_originator_id = Some(tlv);
                }
                Some(TlvType::DynamicHostname) => {
                    let tlv =
                        DynamicHostnameTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.hostname = Some(tlv);
                }
                Some(TlvType::ExtIsReach) => {
                    let tlv = ExtIsReachTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.ext_is_reach.push(tlv);
                }
                Some(TlvType::ProtocolsSupported) => {
                    if tlvs.protocols_supported.is_some() {
                        continue;
                    }
                    let tlv =
                        ProtocolsSupportedTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.protocols_supported = Some(tlv);
                }
                Some(TlvType::Ipv4Addresses) => {
                    let tlv = Ipv4AddressesTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.ipv4_addrs.push(tlv);
                }
                Some(TlvType::Ipv6Addresses) => {
                    let tlv = Ipv6AddressesTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.ipv6_addrs.push(tlv);
                }
                _ => {
                    // Save unknown top-level TLV.
                    tlvs.unknown
                        .push(UnknownTlv::new(tlv_type, tlv_len, buf_tlv));
                }
            }
        }

        Ok(Lsp {
            hdr,
            rem_lifetime,
            lsp_id,
            seqno,
            cksum,
            flags,
            tlvs,
            raw: buf_orig,
            base_time: Some(Instant::now()),
        })
    }

    // Encodes the LSP, updating its raw data and checksum.
    //
    // The base time is reset since the encoded remaining lifetime is the
    // current one.
    pub fn encode(&mut self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = pdu_encode_start(buf, &self.hdr);

            // The PDU length will be initialized later.
            let len_pos = buf.len();
            buf.put_u16(0);
            buf.put_u16(self.rem_lifetime);
            self.lsp_id.encode(&mut buf);
            buf.put_u32(self.seqno);
            // The checksum will be initialized later.
            buf.put_u16(0);
            buf.put_u8(self.flags.bits());

            // Encode TLVs.
            for tlv in &self.tlvs.area_addrs {
                tlv.encode(&mut buf);
            }
            if let Some(tlv) = &self.tlvs.protocols_supported {
                tlv.encode(&mut buf);
            }
            if let Some(tlv) = &self.tlvs.purge_originator_id {
                tlv.encode(&mut buf);
            }
            if let Some(tlv) = &self.tlvs.hostname {
                tlv.encode(&mut buf);
            }
            for tlv in &self.tlvs.ipv4_addrs {
                tlv.encode(&mut buf);
            }
            for tlv in &self.tlvs.ipv6_addrs {
                tlv.encode(&mut buf);
            }
            for tlv in &self.tlvs.ext_is_reach {
                tlv.encode(&mut buf);
            }
            for tlv in &self.tlvs.unknown {
                tlv.encode(&mut buf);
            }

            let bytes = pdu_encode_end(buf, len_pos, Some(self));
            self.raw = bytes.clone();
            self.base_time = Some(Instant::now());
            bytes
        })
    }

    // Computes the LSP checksum.
    fn checksum(data: &[u8]) -> [u8; 2] {
        let checksum = fletcher::calc_fletcher16(data);
        let mut checkbyte0 = (checksum & 0x00FF) as i32;
        let mut checkbyte1 = ((checksum >> 8) & 0x00FF) as i32;

        // Adjust checksum value using scaling factor.
        let sop = data.len() as i32 - 13;
        let mut x = (sop * checkbyte0 - checkbyte1) % 255;
        if x <= 0 {
            x += 255;
        }
        checkbyte1 = 510 - checkbyte0 - x;
        if checkbyte1 > 255 {
            checkbyte1 -= 255;
        }
        checkbyte0 = x;
        [checkbyte0 as u8, checkbyte1 as u8]
    }

    // Checks if the LSP checksum is valid.
    pub fn is_checksum_valid(&self) -> bool {
        // RFC 3719 - Section 7:
        // "An implementation SHOULD treat all LSPs with a zero checksum and a
        // non-zero remaining lifetime as if they had as checksum error".
        if self.cksum == 0 {
            return self.rem_lifetime == 0;
        }

        // Skip everything before (and including) the Remaining Lifetime field.
        match self.raw.get(Self::CKSUM_START..) {
            Some(data) => fletcher::calc_fletcher16(data) == 0,
            None => false,
        }
    }

    // Returns the IS-IS level of the LSP.
    pub fn level(&self) -> LevelNumber {
        match self.hdr.pdu_type {
            PduType::LspL2 => LevelNumber::L2,
            _ => LevelNumber::L1,
        }
    }

    // Returns whether the LSP has expired (i.e., its remaining lifetime has
    // reached zero).
    pub fn is_expired(&self) -> bool {
        self.rem_lifetime == 0
    }

    // Returns the current LSP remaining lifetime.
    //
    // This value is computed by subtracting the elapsed time since the LSP was
    // received or originated from its initial lifetime.
    pub fn rem_lifetime(&self) -> u16 {
        let mut rem_lifetime = self.rem_lifetime;

        if let Some(base_time) = self.base_time {
            let elapsed = u16::try_from(base_time.elapsed().as_secs())
                .unwrap_or(u16::MAX);
            rem_lifetime = rem_lifetime.saturating_sub(elapsed);
        }

        rem_lifetime
    }

    // Returns a copy of the raw LSP with the Remaining Lifetime field replaced.
    //
    // The stored raw data is shared with other readers and is never modified.
    pub fn raw_with_rem_lifetime(&self, rem_lifetime: u16) -> Bytes {
        let mut raw = BytesMut::from(self.raw.as_ref());
        if raw.len() >= Self::REM_LIFETIME_RANGE.end {
            raw[Self::REM_LIFETIME_RANGE]
                .copy_from_slice(&rem_lifetime.to_be_bytes());
        }
        raw.freeze()
    }

    // Converts the LSP into an LSP Entry for use in an SNP.
    pub fn as_snp_entry(&self) -> LspEntry {
        LspEntry {
            rem_lifetime: self.rem_lifetime(),
            lsp_id: self.lsp_id,
            seqno: self.seqno,
            cksum: self.cksum,
        }
    }
}

// ===== impl LspTlvs =====

impl LspTlvs {
    pub fn new(
        protocols_supported: impl IntoIterator<Item = u8>,
        area_addrs: impl IntoIterator<Item = AreaAddr>,
        hostname: Option<String>,
        ext_is_reach: impl IntoIterator<Item = ExtIsReach>,
        ipv4_addrs: impl IntoIterator<Item = Ipv4Addr>,
        ipv6_addrs: impl IntoIterator<Item = Ipv6Addr>,
    ) -> Self {
        LspTlvs {
            protocols_supported: Some(ProtocolsSupportedTlv::from(
                protocols_supported,
            )),
            area_addrs: tlv_entries_split(area_addrs),
            purge_originator_id: None,
            hostname: hostname.map(|hostname| DynamicHostnameTlv { hostname }),
            ext_is_reach: tlv_entries_split(ext_is_reach),
            ipv4_addrs: tlv_entries_split(ipv4_addrs),
            ipv6_addrs: tlv_entries_split(ipv6_addrs),
            unknown: Default::default(),
        }
    }

    // Returns the TLVs of a purged LSP.
    pub fn purge(
        purge_originator_id: Option<PurgeOriginatorIdTlv>,
        hostname: Option<DynamicHostnameTlv>,
    ) -> Self {
        LspTlvs {
            purge_originator_id,
            hostname,
            ..Default::default()
        }
    }

    // Takes as many TLVs as will fit into an LSP fragment of the given size.
    //
    // Returns `None` once all TLVs have been consumed.
    pub fn next_chunk(&mut self, max_len: usize) -> Option<Self> {
        let mut rem_len = max_len;
        let protocols_supported = self.protocols_supported.take();
        if let Some(protocols_supported) = &protocols_supported {
            rem_len = rem_len.saturating_sub(protocols_supported.len());
        }
        let purge_originator_id = self.purge_originator_id.take();
        if let Some(purge_originator_id) = &purge_originator_id {
            rem_len = rem_len.saturating_sub(purge_originator_id.len());
        }
        let hostname = self.hostname.take();
        if let Some(hostname) = &hostname {
            rem_len = rem_len.saturating_sub(hostname.len());
        }
        let area_addrs = tlv_take_max(&mut self.area_addrs, &mut rem_len);
        let ipv4_addrs = tlv_take_max(&mut self.ipv4_addrs, &mut rem_len);
        let ipv6_addrs = tlv_take_max(&mut self.ipv6_addrs, &mut rem_len);
        let ext_is_reach = tlv_take_max(&mut self.ext_is_reach, &mut rem_len);
        let unknown = tlv_take_max(&mut self.unknown, &mut rem_len);

        let chunk = LspTlvs {
            protocols_supported,
            area_addrs,
            purge_originator_id,
            hostname,
            ext_is_reach,
            ipv4_addrs,
            ipv6_addrs,
            unknown,
        };
        if chunk == LspTlvs::default() {
            return None;
        }
        Some(chunk)
    }

    // Checks whether the TLVs are acceptable in a purged LSP.
    //
    // RFC 6232 restricts purges to the Purge Originator Identification and
    // Dynamic Hostname TLVs. Unknown TLVs are ignored.
    pub fn valid_purge_tlvs(&self) -> bool {
        self.protocols_supported.is_none()
            && self.area_addrs.is_empty()
            && self.ext_is_reach.is_empty()
            && self.ipv4_addrs.is_empty()
            && self.ipv6_addrs.is_empty()
    }

    // Returns an iterator over all protocols supported.
    pub fn protocols_supported(&self) -> impl Iterator<Item = u8> + '_ {
        self.protocols_supported
            .iter()
            .flat_map(|tlv| tlv.list.iter().copied())
    }

    // Returns an iterator over all area addresses from TLVs of type 1.
    pub fn area_addrs(&self) -> impl Iterator<Item = &AreaAddr> {
        self.area_addrs.iter().flat_map(|tlv| tlv.list.iter())
    }

    // Returns the hostname from the Dynamic Hostname TLV.
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_ref().map(|tlv| tlv.hostname.as_str())
    }

    // Returns an iterator over all IS neighbors from TLVs of type 22.
    pub fn ext_is_reach(&self) -> impl Iterator<Item = &ExtIsReach> {
        self.ext_is_reach.iter().flat_map(|tlv| tlv.list.iter())
    }

    // Returns an iterator over all IPv4 addresses from TLVs of type 132.
    pub fn ipv4_addrs(&self) -> impl Iterator<Item = &Ipv4Addr> {
        self.ipv4_addrs.iter().flat_map(|tlv| tlv.list.iter())
    }

    // Returns an iterator over all IPv6 addresses from TLVs of type 232.
    pub fn ipv6_addrs(&self) -> impl Iterator<Item = &Ipv6Addr> {
        self.ipv6_addrs.iter().flat_map(|tlv| tlv.list.iter())
    }
}

// ===== impl Snp =====

impl Snp {
    pub const CSNP_HEADER_LEN: u8 = 33;
    pub const PSNP_HEADER_LEN: u8 = 17;

    pub fn new(
        level: LevelNumber,
        source: LanId,
        summary: Option<(LspId, LspId)>,
        tlvs: SnpTlvs,
    ) -> Self {
        let pdu_type = match (summary.is_some(), level) {
            (false, LevelNumber::L1) => PduType::PsnpL1,
            (false, LevelNumber::L2) => PduType::PsnpL2,
            (true, LevelNumber::L1) => PduType::CsnpL1,
            (true, LevelNumber::L2) => PduType::CsnpL2,
        };
        Snp {
            hdr: Header::new(pdu_type),
            source,
            summary,
            tlvs,
        }
    }

    fn decode(
        hdr: Header,
        buf: &mut Bytes,
        buf_orig: Bytes,
    ) -> DecodeResult<Self> {
        // Parse PDU length.
        let pdu_len = buf.try_get_u16()?;
        if pdu_len as usize != buf_orig.len() {
            return Err(DecodeError::InvalidPduLength(pdu_len));
        }

        // Parse source ID.
        let source = LanId::decode(buf)?;

        // Parse start and end LSP IDs.
        let mut summary = None;
        if matches!(hdr.pdu_type, PduType::CsnpL1 | PduType::CsnpL2) {
            let start_lsp_id = LspId::decode(buf)?;
            let end_lsp_id = LspId::decode(buf)?;
            summary = Some((start_lsp_id, end_lsp_id));
        }

        // Parse top-level TLVs.
        let mut tlvs = SnpTlvs::default();
        while buf.remaining() >= TLV_HDR_SIZE {
            // Parse TLV type.
            let tlv_type = buf.try_get_u8()?;
            let tlv_etype = TlvType::from_u8(tlv_type);

            // Parse and validate TLV length.
            let tlv_len = buf.try_get_u8()?;
            if tlv_len as usize > buf.remaining() {
                return Err(DecodeError::InvalidTlvLength(tlv_len));
            }

            // Parse TLV value.
            let mut buf_tlv = buf.copy_to_bytes(tlv_len as usize);
            match tlv_etype {
                Some(TlvType::LspEntries) => {
                    let tlv = LspEntriesTlv::decode(tlv_len, &mut buf_tlv)?;
                    tlvs.lsp_entries.push(tlv);
                }
                _ => {
                    // Save unknown top-level TLV.
                    tlvs.unknown
                        .push(UnknownTlv::new(tlv_type, tlv_len, buf_tlv));
                }
            }
        }

        Ok(Snp {
            hdr,
            source,
            summary,
            tlvs,
        })
    }

    pub fn encode(&self) -> Bytes {
        TLS_BUF.with(|buf| {
            let mut buf = pdu_encode_start(buf, &self.hdr);

            // The PDU length will be initialized later.
            let len_pos = buf.len();
            buf.put_u16(0);
            self.source.encode(&mut buf);

            if let Some((start_lsp_id, end_lsp_id)) = &self.summary {
                start_lsp_id.encode(&mut buf);
                end_lsp_id.encode(&mut buf);
            }

            // Encode TLVs.
            for tlv in &self.tlvs.lsp_entries {
                tlv.encode(&mut buf);
            }

            pdu_encode_end(buf, len_pos, None)
        })
    }

    // Returns the IS-IS level of the SNP.
    pub fn level(&self) -> LevelNumber {
        match self.hdr.pdu_type {
            PduType::CsnpL2 | PduType::PsnpL2 => LevelNumber::L2,
            _ => LevelNumber::L1,
        }
    }
}

// ===== impl SnpTlvs =====

impl SnpTlvs {
    pub fn new(lsp_entries: impl IntoIterator<Item = LspEntry>) -> Self {
        // Fragment TLVs as necessary.
        let lsp_entries = lsp_entries
            .into_iter()
            .collect::<Vec<_>>()
            .chunks(LspEntriesTlv::MAX_ENTRIES)
            .map(|chunk| LspEntriesTlv {
                list: chunk.to_vec(),
            })
            .collect();

        SnpTlvs {
            lsp_entries,
            unknown: Default::default(),
        }
    }

    // Calculates the maximum number of LSP entries that can fit within the
    // given size.
    pub const fn max_lsp_entries(mut size: usize) -> usize {
        let mut lsp_entries = 0;

        // Calculate how many full TLVs fit in the available size.
        let full_tlvs = size / LspEntriesTlv::MAX_SIZE;

        // Update the remaining size after accounting for all full TLVs.
        size %= LspEntriesTlv::MAX_SIZE;

        // Add the number of LSP entries from all full TLVs.
        lsp_entries +=
            full_tlvs * (LspEntriesTlv::MAX_SIZE / LspEntriesTlv::ENTRY_SIZE);

        // Check if the remaining size has enough room for a partial TLV.
        if size >= (TLV_HDR_SIZE + LspEntriesTlv::ENTRY_SIZE) {
            // Add the number of LSP entries from the remaining partial TLV.
            lsp_entries += (size - TLV_HDR_SIZE) / LspEntriesTlv::ENTRY_SIZE;
        }

        lsp_entries
    }

    // Returns an iterator over all LSP entries from TLVs of type 9.
    pub fn lsp_entries(&self) -> impl Iterator<Item = &LspEntry> {
        self.lsp_entries.iter().flat_map(|tlv| tlv.list.iter())
    }
}

// ===== helper functions =====

fn pdu_encode_start<'a>(
    buf: &'a RefCell<BytesMut>,
    hdr: &Header,
) -> RefMut<'a, BytesMut> {
    let mut buf = buf.borrow_mut();
    buf.clear();
    hdr.encode(&mut buf);
    buf
}

fn pdu_encode_end(
    mut buf: RefMut<'_, BytesMut>,
    len_pos: usize,
    lsp: Option<&mut Lsp>,
) -> Bytes {
    // Initialize PDU length.
    let pkt_len = buf.len() as u16;
    buf[len_pos..len_pos + 2].copy_from_slice(&pkt_len.to_be_bytes());

    if let Some(lsp) = lsp {
        // Purged LSPs are sent with a zero checksum. Otherwise, compute and
        // initialize the LSP checksum.
        let cksum = if lsp.rem_lifetime == 0 {
            [0; 2]
        } else {
            Lsp::checksum(&buf[Lsp::CKSUM_START..])
        };
        buf[Lsp::CKSUM_RANGE].copy_from_slice(&cksum);
        lsp.cksum = u16::from_be_bytes(cksum);
    }

    buf.clone().freeze()
}
