//! Identifier types
//!
//! Addresses name accounts and contracts alike. Contract addresses are
//! derived deterministically so that replaying the same sequence of
//! operations always yields the same handles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CoreError, CoreResult};

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

/// An account or contract address, `0x` followed by 40 lowercase hex chars
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// The all-zero address
    pub fn zero() -> Self {
        Self(format!("0x{}", "00".repeat(ADDRESS_LEN)))
    }

    /// Derive an address from a namespace and seed bytes
    pub fn derive(namespace: &str, seed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        hasher.update([0u8]);
        hasher.update(seed);
        let digest = hasher.finalize();
        Self(format!("0x{}", hex::encode(&digest[..ADDRESS_LEN])))
    }

    /// Stable address for a human-readable account label
    pub fn from_label(label: &str) -> Self {
        Self::derive("account", label.as_bytes())
    }

    /// The address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let body = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidAddress(s.to_string()))?;
        if body.len() != ADDRESS_LEN * 2 || hex::decode(body).is_err() {
            return Err(CoreError::InvalidAddress(s.to_string()));
        }
        Ok(Self(format!("0x{}", body.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

/// Caller-supplied proposal identifier
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(Vec<u8>);

impl ProposalId {
    /// Wrap raw identifier bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex rendering with `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl From<&str> for ProposalId {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for ProposalId {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => f.write_str(text),
            Err(_) => f.write_str(&self.to_hex()),
        }
    }
}

impl fmt::Debug for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProposalId({})", self)
    }
}

/// Opaque 32-byte commitment attached to a proposal
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MerkleRoot([u8; 32]);

impl MerkleRoot {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a 64 character hex string, with or without `0x`
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        let decoded =
            hex::decode(body).map_err(|_| CoreError::InvalidMerkleRoot(s.to_string()))?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| CoreError::InvalidMerkleRoot(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Hash arbitrary content into a root
    pub fn digest(content: &[u8]) -> Self {
        Self(Sha256::digest(content).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MerkleRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MerkleRoot({})", self.to_hex())
    }
}

/// Side of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// In favour of the proposal
    For,
    /// Against the proposal
    Against,
}

impl Decision {
    /// `true` maps to [`Decision::For`]
    pub fn from_support(support: bool) -> Self {
        if support {
            Self::For
        } else {
            Self::Against
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::For => Self::Against,
            Self::Against => Self::For,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::For => f.write_str("for"),
            Self::Against => f.write_str("against"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_addresses_are_stable_and_distinct() {
        let a = Address::derive("dao", b"1");
        let b = Address::derive("dao", b"1");
        let c = Address::derive("dao", b"2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 2 + ADDRESS_LEN * 2);
    }

    #[test]
    fn test_address_parsing() {
        let parsed: Address = "0xABCDEF0123456789abcdef0123456789ABCDEF01".parse().unwrap();
        assert_eq!(parsed.as_str(), "0xabcdef0123456789abcdef0123456789abcdef01");
        assert!("abcdef".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!(format!("0x{}", "zz".repeat(20)).parse::<Address>().is_err());
    }

    #[test]
    fn test_merkle_root_hex() {
        let hex_root = format!("0x{}", "ab".repeat(32));
        let root = MerkleRoot::from_hex(&hex_root).unwrap();
        assert_eq!(root.to_hex(), hex_root);
        assert_eq!(MerkleRoot::from_hex(&"ab".repeat(32)).unwrap(), root);
        assert!(MerkleRoot::from_hex("0xabcd").is_err());
    }

    #[test]
    fn test_proposal_id_display() {
        let id = ProposalId::from("proposal-1");
        assert_eq!(id.to_string(), "proposal-1");
        assert_eq!(id.to_hex(), format!("0x{}", hex::encode("proposal-1")));
    }
}
