use bytemuck::{Pod, Zeroable};

/// Every wire message starts with this fixed 8-byte header.
///
/// Wire endianness is explicitly little-endian (see DESIGN.md — §9 of the
/// spec leaves this an open question in the original source, which encoded
/// host-endian; we fix LE so heterogeneous deployments interoperate).
pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct MsgHeader {
    pub msg_type: u32,
    pub size: u32,
}

impl MsgHeader {
    pub fn new(msg_type: u32, size: u32) -> Self {
        Self { msg_type, size }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.msg_type.to_le_bytes());
        out[4..8].copy_from_slice(&self.size.to_le_bytes());
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Self {
        debug_assert!(buf.len() >= HEADER_LEN);
        let msg_type = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let size = u32::from_le_bytes(buf[4..8].try_into().unwrap());
        Self { msg_type, size }
    }
}
