//! Component A: the NetTrx wire protocol — fixed 8-byte header framing,
//! the typed message catalog, and the reassembly state machine described in
//! spec §3/§4.1.

pub mod codec;
pub mod error;
pub mod header;
pub mod message;

pub use codec::{encode_message, write_message, MessageReader, Reassembler, DEFAULT_BUF_CAP};
pub use error::{WireError, WireResult};
pub use header::{MsgHeader, HEADER_LEN};
pub use message::{CodecOption, CodecSelect, Message, Modulation, MuteState, TxCtrlMode};

/// Current protocol version (spec §6).
pub const PROTO_MAJOR: u16 = 2;
pub const PROTO_MINOR: u16 = 7;

/// Default hub TCP listen port (spec §6).
pub const DEFAULT_PORT: u16 = 5210;
