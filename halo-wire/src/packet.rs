//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::bytes_ext::{BytesExt, BytesMutExt};
use crate::error::{DecodeError, DecodeResult};
use crate::lsa::{Lsa, LsaHeader};

pub const VERSION: u8 = 2;

pub const PKT_TYPE_HELLO: u8 = 1;
pub const PKT_TYPE_LSU: u8 = 4;

pub const ALL_OSPF_ROUTERS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 5);
pub const IP_PROTO_OSPF: u8 = 89;

//
// Common header (24 bytes):
//
// version(1) | type(1) | packet_length(2)
// router_id(4)
// area_id(4)
// checksum(2) | au_type(2)
// authentication(8)
//
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct PacketHdr {
    pub version: u8,
    pub packet_type: u8,
    pub packet_length: u16,
    pub router_id: Ipv4Addr,
    pub area_id: u32,
    pub checksum: u16,
    pub au_type: u16,
    pub authentication: u64,
}

impl PacketHdr {
    pub const LENGTH: u16 = 24;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH as usize {
            return Err(DecodeError::Truncated);
        }
        let version = buf.get_u8();
        let packet_type = buf.get_u8();
        let packet_length = buf.get_u16();
        let router_id = buf.try_get_ipv4().map_err(|_| DecodeError::Truncated)?;
        let area_id = buf.get_u32();
        let checksum = buf.get_u16();
        let au_type = buf.get_u16();
        let authentication = buf.get_u64();
        Ok(PacketHdr {
            version,
            packet_type,
            packet_length,
            router_id,
            area_id,
            checksum,
            au_type,
            authentication,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.packet_type);
        buf.put_u16(self.packet_length);
        buf.put_ipv4(&self.router_id);
        buf.put_u32(self.area_id);
        buf.put_u16(self.checksum);
        buf.put_u16(self.au_type);
        buf.put_u64(self.authentication);
    }
}

//
// HelloBody. Fixed 20-byte prefix followed by `neighbor_ids.len() * 4` bytes.
//
// network_mask(4) | hello_interval(2) | options(1) | rtr_priority(1)
// router_dead_interval(4)
// designated_router_id(4)
// backup_designated_router_id(4)
// neighbor_ids(4 * n)
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct HelloBody {
    pub network_mask: u32,
    pub hello_interval: u16,
    pub options: u8,
    pub rtr_priority: u8,
    pub router_dead_interval: u32,
    pub designated_router_id: u32,
    pub backup_designated_router_id: u32,
    pub neighbor_ids: Vec<u32>,
}

impl HelloBody {
    pub const BASE_LENGTH: u16 = 20;

    fn decode(buf: &mut Bytes, body_len: u16) -> DecodeResult<Self> {
        if body_len < Self::BASE_LENGTH || (body_len - Self::BASE_LENGTH) % 4 != 0 {
            return Err(DecodeError::Truncated);
        }
        if (body_len as usize) > buf.remaining() {
            return Err(DecodeError::Truncated);
        }
        let network_mask = buf.get_u32();
        let hello_interval = buf.get_u16();
        let options = buf.get_u8();
        let rtr_priority = buf.get_u8();
        let router_dead_interval = buf.get_u32();
        let designated_router_id = buf.get_u32();
        let backup_designated_router_id = buf.get_u32();
        let num_neighbors = (body_len - Self::BASE_LENGTH) / 4;
        let mut neighbor_ids = Vec::with_capacity(num_neighbors as usize);
        for _ in 0..num_neighbors {
            neighbor_ids.push(buf.get_u32());
        }
        Ok(HelloBody {
            network_mask,
            hello_interval,
            options,
            rtr_priority,
            router_dead_interval,
            designated_router_id,
            backup_designated_router_id,
            neighbor_ids,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.network_mask);
        buf.put_u16(self.hello_interval);
        buf.put_u8(self.options);
        buf.put_u8(self.rtr_priority);
        buf.put_u32(self.router_dead_interval);
        buf.put_u32(self.designated_router_id);
        buf.put_u32(self.backup_designated_router_id);
        for id in &self.neighbor_ids {
            buf.put_u32(*id);
        }
    }

    pub fn wire_len(&self) -> u16 {
        Self::BASE_LENGTH + self.neighbor_ids.len() as u16 * 4
    }
}

/// LSU body: a count followed by exactly that many LSA records.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsuBody {
    pub lsas: Vec<Lsa>,
}

impl LsuBody {
    fn decode(buf: &mut Bytes, body_len: u16) -> DecodeResult<Self> {
        if body_len < 4 {
            return Err(DecodeError::Truncated);
        }
        if (body_len as usize) > buf.remaining() {
            return Err(DecodeError::Truncated);
        }
        let mut body_buf = buf.split_to(body_len as usize);
        let num_of_lsas = body_buf.get_u32();
        let mut lsas = Vec::with_capacity(num_of_lsas as usize);
        for _ in 0..num_of_lsas {
            if body_buf.remaining() < LsaHeader::LENGTH as usize {
                return Err(DecodeError::Truncated);
            }
            lsas.push(Lsa::decode(&mut body_buf)?);
        }
        Ok(LsuBody { lsas })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.lsas.len() as u32);
        for lsa in &self.lsas {
            lsa.encode(buf);
        }
    }

    pub fn wire_len(&self) -> u16 {
        4 + self.lsas.iter().map(Lsa::wire_len).sum::<u16>()
    }
}

/// Payload carried by a [`Pwospf`] packet.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum PwospfContent {
    Hello(HelloBody),
    Lsu(LsuBody),
}

impl PwospfContent {
    fn wire_len(&self) -> u16 {
        match self {
            PwospfContent::Hello(body) => body.wire_len(),
            PwospfContent::Lsu(body) => body.wire_len(),
        }
    }

    fn packet_type(&self) -> u8 {
        match self {
            PwospfContent::Hello(_) => PKT_TYPE_HELLO,
            PwospfContent::Lsu(_) => PKT_TYPE_LSU,
        }
    }
}

/// A fully decoded PWOSPF packet. Immutable once constructed; `link_name`
/// never travels on the wire, it tags which local interface this value
/// arrived on or will be sent out of.
#[derive(Clone, Debug, PartialEq)]
pub struct Pwospf {
    pub version: u8,
    pub router_id: Ipv4Addr,
    pub area_id: u32,
    pub checksum: u16,
    pub au_type: u16,
    pub authentication: u64,
    pub content: PwospfContent,
    pub link_name: Option<String>,
}

impl Pwospf {
    /// Builds a fresh Hello/LSU value with the boilerplate header fields
    /// (version, checksum, au_type, authentication) zeroed/defaulted, ready
    /// for the router control loop to fill in `content`.
    pub fn new(router_id: Ipv4Addr, area_id: u32, content: PwospfContent) -> Self {
        Pwospf {
            version: VERSION,
            router_id,
            area_id,
            checksum: 0,
            au_type: 0,
            authentication: 0,
            content,
            link_name: None,
        }
    }

    pub fn with_link_name(mut self, link_name: impl Into<String>) -> Self {
        self.link_name = Some(link_name.into());
        self
    }

    pub fn packet_length(&self) -> u16 {
        PacketHdr::LENGTH + self.content.wire_len()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.packet_length() as usize);
        let hdr = PacketHdr {
            version: self.version,
            packet_type: self.content.packet_type(),
            packet_length: self.packet_length(),
            router_id: self.router_id,
            area_id: self.area_id,
            checksum: self.checksum,
            au_type: self.au_type,
            authentication: self.authentication,
        };
        hdr.encode(&mut buf);
        match &self.content {
            PwospfContent::Hello(body) => body.encode(&mut buf),
            PwospfContent::Lsu(body) => body.encode(&mut buf),
        }
        buf.freeze()
    }

    /// Decodes a packet received on `link_name`. `link_name` is attached to
    /// the result but plays no part in wire validation.
    pub fn decode(mut bytes: Bytes, link_name: impl Into<String>) -> DecodeResult<Self> {
        if bytes.remaining() < PacketHdr::LENGTH as usize {
            return Err(DecodeError::Truncated);
        }
        let hdr = PacketHdr::decode(&mut bytes)?;
        if hdr.version != VERSION {
            return Err(DecodeError::UnsupportedVersion(hdr.version));
        }
        if hdr.packet_type != PKT_TYPE_HELLO && hdr.packet_type != PKT_TYPE_LSU {
            return Err(DecodeError::UnsupportedType(hdr.packet_type));
        }
        if hdr.packet_length < PacketHdr::LENGTH {
            return Err(DecodeError::InvalidLength(hdr.packet_length));
        }
        let body_len = hdr.packet_length - PacketHdr::LENGTH;
        if (body_len as usize) > bytes.remaining() {
            return Err(DecodeError::Truncated);
        }
        let content = match hdr.packet_type {
            PKT_TYPE_HELLO => PwospfContent::Hello(HelloBody::decode(&mut bytes, body_len)?),
            PKT_TYPE_LSU => PwospfContent::Lsu(LsuBody::decode(&mut bytes, body_len)?),
            _ => unreachable!(),
        };
        Ok(Pwospf {
            version: hdr.version,
            router_id: hdr.router_id,
            area_id: hdr.area_id,
            checksum: hdr.checksum,
            au_type: hdr.au_type,
            authentication: hdr.authentication,
            content,
            link_name: Some(link_name.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_pwospf() -> Pwospf {
        Pwospf::new(
            Ipv4Addr::new(10, 0, 0, 1),
            0,
            PwospfContent::Hello(HelloBody {
                network_mask: u32::from(Ipv4Addr::new(255, 255, 255, 0)),
                hello_interval: 3,
                options: 0,
                rtr_priority: 1,
                router_dead_interval: 12,
                designated_router_id: 0,
                backup_designated_router_id: 0,
                neighbor_ids: vec![0x0a000002],
            }),
        )
    }

    #[test]
    fn hello_round_trips() {
        let pwospf = hello_pwospf();
        let encoded = pwospf.encode();
        let decoded = Pwospf::decode(encoded, "halo1").unwrap();
        assert_eq!(decoded.router_id, pwospf.router_id);
        assert_eq!(decoded.content, pwospf.content);
        assert_eq!(decoded.link_name.as_deref(), Some("halo1"));
    }

    #[test]
    fn encoded_length_matches_packet_length() {
        let pwospf = hello_pwospf();
        let encoded = pwospf.encode();
        assert_eq!(encoded.len() as u16, pwospf.packet_length());
    }

    #[test]
    fn rejects_truncated_header() {
        let short = Bytes::from_static(&[0u8; 23]);
        assert_eq!(Pwospf::decode(short, "halo1"), Err(DecodeError::Truncated));
    }

    #[test]
    fn rejects_packet_length_mismatch() {
        let mut pwospf = hello_pwospf();
        pwospf.checksum = 0;
        let mut encoded = BytesMut::from(&pwospf.encode()[..44]);
        // Claim a packet_length of 60 while only shipping 44 bytes.
        encoded[2] = 0;
        encoded[3] = 60;
        assert_eq!(
            Pwospf::decode(encoded.freeze(), "halo1"),
            Err(DecodeError::Truncated)
        );
    }

    #[test]
    fn rejects_bad_version() {
        let mut raw = BytesMut::from(&hello_pwospf().encode()[..]);
        raw[0] = 3;
        assert_eq!(
            Pwospf::decode(raw.freeze(), "halo1"),
            Err(DecodeError::UnsupportedVersion(3))
        );
    }

    #[test]
    fn rejects_bad_type() {
        let mut raw = BytesMut::from(&hello_pwospf().encode()[..]);
        raw[1] = 7;
        assert_eq!(
            Pwospf::decode(raw.freeze(), "halo1"),
            Err(DecodeError::UnsupportedType(7))
        );
    }
}
