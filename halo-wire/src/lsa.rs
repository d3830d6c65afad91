//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::bytes_ext::{BytesExt, BytesMutExt};
use crate::error::{DecodeError, DecodeResult};

/// LSA type code. Only Router-LSA (1) is implemented; any other value is
/// rejected by the decoder.
pub const LSA_TYPE_ROUTER: u16 = 1;

//
// LSA header.
//
// Encoding format (20 bytes):
//
//  0                   1                   2                   3
//  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |            LS age             |    Options    |    LS type    |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                        Link State ID                          |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     Advertising Router                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |                     LS sequence number                        |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
// |         LS checksum           |             length            |
// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//
// NOTE: `ls_type` is declared here as a full word for symmetry with the rest
// of the data model, but only the low byte travels on the wire -- the 20-byte
// header width is the binding constraint (the real OSPFv2 LS type field is a
// single octet).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct LsaHeader {
    pub ls_age: u16,
    pub ls_options: u8,
    pub ls_type: u16,
    pub link_state_id: Ipv4Addr,
    pub adv_router: Ipv4Addr,
    pub ls_seq_number: u32,
    pub ls_checksum: u16,
    pub length: u16,
}

impl LsaHeader {
    pub const LENGTH: u16 = 20;

    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH as usize {
            return Err(DecodeError::Truncated);
        }
        let ls_age = buf.get_u16();
        let ls_options = buf.get_u8();
        let ls_type = buf.get_u8() as u16;
        let link_state_id = buf.try_get_ipv4().map_err(|_| DecodeError::Truncated)?;
        let adv_router = buf.try_get_ipv4().map_err(|_| DecodeError::Truncated)?;
        let ls_seq_number = buf.get_u32();
        let ls_checksum = buf.get_u16();
        let length = buf.get_u16();
        Ok(LsaHeader {
            ls_age,
            ls_options,
            ls_type,
            link_state_id,
            adv_router,
            ls_seq_number,
            ls_checksum,
            length,
        })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16(self.ls_age);
        buf.put_u8(self.ls_options);
        buf.put_u8(self.ls_type as u8);
        buf.put_ipv4(&self.link_state_id);
        buf.put_ipv4(&self.adv_router);
        buf.put_u32(self.ls_seq_number);
        buf.put_u16(self.ls_checksum);
        buf.put_u16(self.length);
    }
}

// OSPFv2 Router LSA Link Type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum RouterLinkType {
    PointToPoint = 0x01,
    TransitNetwork = 0x02,
    StubNetwork = 0x03,
    VirtualLink = 0x04,
}

impl RouterLinkType {
    fn from_u8(value: u8) -> Self {
        match value {
            0x02 => RouterLinkType::TransitNetwork,
            0x03 => RouterLinkType::StubNetwork,
            0x04 => RouterLinkType::VirtualLink,
            _ => RouterLinkType::PointToPoint,
        }
    }
}

//
// Router-LSA link record (12 bytes):
//
// link_id(4) | link_data(4) | type(1) | tos(1, reserved) | metric(2)
//
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouterLink {
    pub link_id: Ipv4Addr,
    pub link_data: Ipv4Addr,
    pub link_type: RouterLinkType,
    pub metric: u16,
}

impl RouterLink {
    pub const LENGTH: u16 = 12;

    fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        if buf.remaining() < Self::LENGTH as usize {
            return Err(DecodeError::Truncated);
        }
        let link_id = buf.try_get_ipv4().map_err(|_| DecodeError::Truncated)?;
        let link_data = buf.try_get_ipv4().map_err(|_| DecodeError::Truncated)?;
        let link_type = RouterLinkType::from_u8(buf.get_u8());
        let _tos = buf.get_u8();
        let metric = buf.get_u16();
        Ok(RouterLink {
            link_id,
            link_data,
            link_type,
            metric,
        })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_ipv4(&self.link_id);
        buf.put_ipv4(&self.link_data);
        buf.put_u8(self.link_type as u8);
        buf.put_u8(0);
        buf.put_u16(self.metric);
    }
}

//
// Router-LSA body. A 4-byte sub-header (flags, one reserved byte, #links)
// followed by `links.len() * 12` bytes of link records.
//
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct RouterLsa {
    pub flags: u8,
    pub links: Vec<RouterLink>,
}

impl RouterLsa {
    pub const BASE_LENGTH: u16 = 4;

    fn decode(buf: &mut Bytes, body_len: u16) -> DecodeResult<Self> {
        if body_len < Self::BASE_LENGTH {
            return Err(DecodeError::Truncated);
        }
        let flags = buf.get_u8();
        let _reserved = buf.get_u8();
        let num_links = buf.get_u16();
        let expected = Self::BASE_LENGTH + num_links * RouterLink::LENGTH;
        if expected != body_len {
            return Err(DecodeError::Truncated);
        }
        let mut links = Vec::with_capacity(num_links as usize);
        for _ in 0..num_links {
            links.push(RouterLink::decode(buf)?);
        }
        Ok(RouterLsa { flags, links })
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags);
        buf.put_u8(0);
        buf.put_u16(self.links.len() as u16);
        for link in &self.links {
            link.encode(buf);
        }
    }

    pub fn wire_len(&self) -> u16 {
        Self::BASE_LENGTH + self.links.len() as u16 * RouterLink::LENGTH
    }
}

/// One LSA record: header plus a Router-LSA body (the only supported type).
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Lsa {
    pub header: LsaHeader,
    pub body: RouterLsa,
}

impl Lsa {
    pub(crate) fn decode(buf: &mut Bytes) -> DecodeResult<Self> {
        let header = LsaHeader::decode(buf)?;
        if header.length < LsaHeader::LENGTH {
            return Err(DecodeError::Truncated);
        }
        let body_len = header.length - LsaHeader::LENGTH;
        if (body_len as usize) > buf.remaining() {
            return Err(DecodeError::Truncated);
        }
        if header.ls_type != LSA_TYPE_ROUTER {
            return Err(DecodeError::UnsupportedLsaType(header.ls_type));
        }
        let mut body_buf = buf.split_to(body_len as usize);
        let body = RouterLsa::decode(&mut body_buf, body_len)?;
        Ok(Lsa { header, body })
    }

    pub(crate) fn encode(&self, buf: &mut BytesMut) {
        let mut header = self.header;
        header.length = LsaHeader::LENGTH + self.body.wire_len();
        header.encode(buf);
        self.body.encode(buf);
    }

    pub fn wire_len(&self) -> u16 {
        LsaHeader::LENGTH + self.body.wire_len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lsa() -> Lsa {
        Lsa {
            header: LsaHeader {
                ls_age: 0,
                ls_options: 0,
                ls_type: LSA_TYPE_ROUTER,
                link_state_id: Ipv4Addr::new(10, 0, 0, 1),
                adv_router: Ipv4Addr::new(10, 0, 0, 1),
                ls_seq_number: 5,
                ls_checksum: 0,
                length: 0,
            },
            body: RouterLsa {
                flags: 0,
                links: vec![RouterLink {
                    link_id: Ipv4Addr::new(10, 0, 0, 2),
                    link_data: Ipv4Addr::new(10, 0, 0, 1),
                    link_type: RouterLinkType::PointToPoint,
                    metric: 10,
                }],
            },
        }
    }

    #[test]
    fn round_trips_router_lsa() {
        let lsa = sample_lsa();
        let mut buf = BytesMut::new();
        lsa.encode(&mut buf);
        let mut bytes = buf.freeze();
        let decoded = Lsa::decode(&mut bytes).unwrap();
        assert_eq!(decoded.body, lsa.body);
        assert_eq!(decoded.header.adv_router, lsa.header.adv_router);
        assert_eq!(decoded.header.ls_seq_number, lsa.header.ls_seq_number);
    }

    #[test]
    fn rejects_unknown_lsa_type() {
        let mut lsa = sample_lsa();
        lsa.header.ls_type = 2;
        let mut buf = BytesMut::new();
        // Encode manually since `Lsa::encode` doesn't validate the type.
        let mut header = lsa.header;
        header.length = LsaHeader::LENGTH + lsa.body.wire_len();
        header.encode(&mut buf);
        lsa.body.encode(&mut buf);
        let mut bytes = buf.freeze();
        assert_eq!(
            Lsa::decode(&mut bytes),
            Err(DecodeError::UnsupportedLsaType(2))
        );
    }
}
