//! Wire codec for the sync reply payload:
//!
//! ```text
//! Content   ::= CONTENT-TLV   LENGTH *(Name [DataBlock])
//! DataBlock ::= DATABLOCK-TLV LENGTH *OCTET
//! ```
//!
//! Mirrors PSync's `detail::State`: an ordered map from name to optional
//! data block, with a cached wire encoding cleared on mutation (there:
//! `mutable ndn::Block m_wire`, reset in `addContent`; here: a
//! `RefCell<Option<Bytes>>`).

use crate::error::CodecError;
use bytes::{Buf, Bytes, BytesMut};
use psync_types::tlv::{TlvElement, CONTENT_TLV, DATABLOCK_TLV};
use psync_types::Name;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// An ordered collection of `(name, optional data block)` entries. Entries
/// are always stored and emitted in ascending name order.
#[derive(Debug, Default)]
pub struct State {
    content: BTreeMap<Name, Option<Bytes>>,
    /// Memoized encoding of the last `encode()`/`decode()` call; cleared by
    /// any mutating operation. Re-encoding a freshly-decoded `State` returns
    /// this buffer verbatim.
    cached_wire: RefCell<Option<Bytes>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a name, optionally with a piggybacked data block. A `State`
    /// reply never contains a `(name, seq=0)` entry; callers are
    /// responsible for that invariant, as the codec has no way to tell a
    /// "seq" component from any other trailing component.
    pub fn add_content(&mut self, name: Name, block: Option<Bytes>) {
        self.content.insert(name, block);
        *self.cached_wire.borrow_mut() = None;
    }

    pub fn content(&self) -> &BTreeMap<Name, Option<Bytes>> {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn encode(&self) -> Bytes {
        if let Some(cached) = self.cached_wire.borrow().as_ref() {
            return cached.clone();
        }
        let mut value = BytesMut::new();
        for (name, block) in &self.content {
            name.to_tlv().encode(&mut value);
            if let Some(block) = block {
                TlvElement::new(DATABLOCK_TLV, block.clone()).encode(&mut value);
            }
        }
        let mut out = BytesMut::new();
        TlvElement::new(CONTENT_TLV, value.freeze()).encode(&mut out);
        let encoded = out.freeze();
        *self.cached_wire.borrow_mut() = Some(encoded.clone());
        encoded
    }

    pub fn decode(bytes: Bytes) -> Result<Self, CodecError> {
        let mut outer = bytes.clone();
        let outer_element = TlvElement::decode(&mut outer)?;
        if outer_element.typ != CONTENT_TLV {
            return Err(CodecError::WrongOuterType(outer_element.typ));
        }

        let mut content = BTreeMap::new();
        let mut remaining = outer_element.value;
        let mut last_name: Option<Name> = None;
        while remaining.has_remaining() {
            let element = TlvElement::decode(&mut remaining)?;
            match element.typ {
                psync_types::tlv::NAME_TLV => {
                    let name = Name::from_tlv(element)?;
                    content.insert(name.clone(), None);
                    last_name = Some(name);
                }
                DATABLOCK_TLV => {
                    let name = last_name.clone().ok_or(CodecError::DataBlockBeforeName)?;
                    // Multiple consecutive DataBlocks after one Name: last one wins.
                    content.insert(name, Some(element.value));
                }
                other => return Err(CodecError::UnexpectedTlv(other)),
            }
        }

        Ok(Self {
            content,
            cached_wire: RefCell::new(Some(bytes)),
        })
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for State {}
