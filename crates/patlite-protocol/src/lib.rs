pub mod codec;

pub use codec::{CommandPacket, decode, encode};
