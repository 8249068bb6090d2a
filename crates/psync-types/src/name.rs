//! `Name`/`NameComponent` — an opaque, ordered byte-sequence key, the same
//! shape NDN names take. Equality, hashing and ordering are defined here;
//! the rest of the workspace treats a `Name` as an inert unit key.

use crate::tlv::{TlvElement, TlvError, NAME_COMPONENT_TLV, NAME_TLV};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    /// NDN's `appendNumber`: a component holding `value` as fixed 8-byte
    /// big-endian, so that numeric components compare the same way under
    /// both byte-lexicographic and numeric ordering.
    pub fn from_number(value: u64) -> Self {
        Self(Bytes::copy_from_slice(&value.to_be_bytes()))
    }

    pub fn to_number(&self) -> Option<u64> {
        if self.0.len() != 8 {
            return None;
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0);
        Some(u64::from_be_bytes(buf))
    }

    fn to_tlv(&self) -> TlvElement {
        TlvElement::new(NAME_COMPONENT_TLV, self.0.clone())
    }

    fn from_tlv(element: TlvElement) -> Result<Self, TlvError> {
        let element = element.expect_type(NAME_COMPONENT_TLV)?;
        Ok(Self(element.value))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(number) = self.to_number() {
            return write!(f, "{number}");
        }
        let printable = self.0.iter().all(|&b| b.is_ascii_graphic() || b == b' ');
        if printable {
            write!(f, "{}", String::from_utf8_lossy(&self.0))
        } else {
            write!(f, "0x{}", hex::encode(&self.0))
        }
    }
}

/// An opaque, ordered sequence of name components. Ordering is
/// lexicographic component-by-component, matching NDN canonical name
/// ordering, which is also the order a `State` reply is required to walk
/// its entries in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_uri(s: &str) -> Self {
        let components = s
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| NameComponent::new(comp.as_bytes().to_vec()))
            .collect();
        Self { components }
    }

    pub fn push(mut self, component: NameComponent) -> Self {
        self.components.push(component);
        self
    }

    /// NDN's `Name::appendNumber`: derives `prefix ++ seq`. Deterministic
    /// and injective, so two calls with the same sequence always produce
    /// the same name and different sequences never collide.
    pub fn append_number(&self, value: u64) -> Self {
        self.clone().push(NameComponent::from_number(value))
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// `getPrefix(-k)`: all but the last `k` components.
    pub fn prefix_drop_last(&self, k: usize) -> Name {
        let keep = self.components.len().saturating_sub(k);
        Name {
            components: self.components[..keep].to_vec(),
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &NameComponent> {
        self.components.iter()
    }

    pub fn to_uri(&self) -> String {
        self.to_string()
    }

    pub fn to_tlv(&self) -> TlvElement {
        let mut buf = BytesMut::new();
        for component in &self.components {
            component.to_tlv().encode(&mut buf);
        }
        TlvElement::new(NAME_TLV, buf.freeze())
    }

    pub fn from_tlv(element: TlvElement) -> Result<Self, TlvError> {
        let element = element.expect_type(NAME_TLV)?;
        let mut remaining = element.value;
        let mut components = Vec::new();
        while !remaining.is_empty() {
            components.push(NameComponent::from_tlv(TlvElement::decode(&mut remaining)?)?);
        }
        Ok(Self { components })
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }
        for component in &self.components {
            write!(f, "/{component}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_number_is_deterministic_and_injective() {
        let prefix = Name::from_uri("/a/b");
        let a1 = prefix.append_number(1);
        let a2 = prefix.append_number(1);
        let a3 = prefix.append_number(2);
        assert_eq!(a1, a2);
        assert_ne!(a1, a3);
    }

    #[test]
    fn prefix_drop_last_strips_seq_component() {
        let full = Name::from_uri("/a/b").append_number(5);
        assert_eq!(full.prefix_drop_last(1), Name::from_uri("/a/b"));
        assert_eq!(full.get(full.len() - 1).unwrap().to_number(), Some(5));
    }

    #[test]
    fn ordering_is_lexicographic_by_component() {
        let a = Name::from_uri("/a/1");
        let b = Name::from_uri("/a/2");
        let c = Name::from_uri("/b/0");
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn tlv_round_trip() {
        let name = Name::from_uri("/test1/hello").append_number(42);
        let encoded = name.to_tlv();
        let decoded = Name::from_tlv(encoded).unwrap();
        assert_eq!(name, decoded);
    }
}
