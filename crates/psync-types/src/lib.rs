pub mod name;
pub mod tlv;

pub use name::{Name, NameComponent};
pub use tlv::{TlvElement, TlvError, CONTENT_TLV, DATABLOCK_TLV};
