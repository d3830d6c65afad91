//
// SPDX-License-Identifier: MIT
//

//! Byte-exact encoder/decoder for the PWOSPF wire format: the common packet
//! header plus Hello and Link State Update payloads, restricted to
//! Router-LSAs.

mod bytes_ext;
mod error;
mod lsa;
mod packet;

pub use error::{DecodeError, DecodeResult};
pub use lsa::{Lsa, LsaHeader, RouterLink, RouterLinkType, RouterLsa, LSA_TYPE_ROUTER};
pub use packet::{
    HelloBody, LsuBody, PacketHdr, Pwospf, PwospfContent, ALL_OSPF_ROUTERS, IP_PROTO_OSPF,
    PKT_TYPE_HELLO, PKT_TYPE_LSU, VERSION,
};
