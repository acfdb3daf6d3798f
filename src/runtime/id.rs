//! Identity values. Every id embeds the 2-byte type tag of its schema so a
//! polymorphic lookup can find the owning table without scanning a view.
//!
//! Layout (16 bytes, big-endian):
//! `0..6` unix milliseconds, `6..8` type tag, `8..10` microseconds within the
//! millisecond, `10..16` random.

use crate::error::EntError;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const TAG_OFFSET: usize = 6;

/// First two bytes of the SHA-256 of the schema base name (`EntTestObject`).
pub fn type_tag(base_name: &str) -> [u8; 2] {
    let digest = Sha256::digest(base_name.as_bytes());
    [digest[0], digest[1]]
}

pub fn generate_id(tag: [u8; 2], created_at: DateTime<Utc>) -> Uuid {
    let millis = created_at.timestamp_millis().to_be_bytes();
    let micros = (created_at.timestamp_subsec_micros() % 1000) as u16;
    let random = Uuid::new_v4();
    let mut bytes = [0u8; 16];
    bytes[0..6].copy_from_slice(&millis[2..8]);
    bytes[TAG_OFFSET..TAG_OFFSET + 2].copy_from_slice(&tag);
    bytes[8..10].copy_from_slice(&micros.to_be_bytes());
    bytes[10..16].copy_from_slice(&random.as_bytes()[10..16]);
    Uuid::from_bytes(bytes)
}

pub fn id_type_tag(id: Uuid) -> [u8; 2] {
    let bytes = id.as_bytes();
    [bytes[TAG_OFFSET], bytes[TAG_OFFSET + 1]]
}

/// Loader argument: a structured id or its string encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntIdInput {
    Id(Uuid),
    Str(String),
}

impl EntIdInput {
    pub fn parse(&self) -> Result<Uuid, EntError> {
        match self {
            EntIdInput::Id(id) => Ok(*id),
            EntIdInput::Str(s) => Uuid::parse_str(s)
                .map_err(|_| EntError::Validation(format!("Invalid ID format for {}", s))),
        }
    }
}

impl From<Uuid> for EntIdInput {
    fn from(id: Uuid) -> Self {
        EntIdInput::Id(id)
    }
}

impl From<&Uuid> for EntIdInput {
    fn from(id: &Uuid) -> Self {
        EntIdInput::Id(*id)
    }
}

impl From<&str> for EntIdInput {
    fn from(s: &str) -> Self {
        EntIdInput::Str(s.to_string())
    }
}

impl From<String> for EntIdInput {
    fn from(s: String) -> Self {
        EntIdInput::Str(s)
    }
}
