//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut, TryGetError};

/// Extension methods for reading PWOSPF wire primitives out of a [`Bytes`]
/// cursor, mirroring the `try_get_*` helpers a packet decoder needs.
pub trait BytesExt {
    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError>;
}

/// Extension methods for writing PWOSPF wire primitives into a [`BytesMut`].
pub trait BytesMutExt {
    fn put_ipv4(&mut self, addr: &Ipv4Addr);
}

impl BytesExt for Bytes {
    fn try_get_ipv4(&mut self) -> Result<Ipv4Addr, TryGetError> {
        let bytes = self.try_get_u32()?;
        Ok(Ipv4Addr::from(bytes))
    }
}

impl BytesMutExt for BytesMut {
    fn put_ipv4(&mut self, addr: &Ipv4Addr) {
        self.put_u32((*addr).into())
    }
}
