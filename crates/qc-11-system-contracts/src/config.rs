//! # System Contract Configuration
//!
//! Reserved addresses and tunables for the built-in system contracts.
//!
//! ## Config File Format
//!
//! ```toml
//! buffer_address = "0x0000000000000000000000000000000000011111"
//! object_storage_address = "0x0000000000000000000000000000000000011110"
//! bridge_address = "0x0000000000000000000000000000000000011101"
//!
//! [buffer]
//! cache_key = "SystemBufferCacheKey"
//!
//! [object_storage]
//! copy_chunk_size = 4096
//! ```
//!
//! Every field is optional; missing fields take the defaults below.

use crate::domain::value_objects::Address;
use crate::errors::ConfigError;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Default address of the system buffer contract.
pub const SYSTEM_BUFFER_ADDRESS: Address = reserved_address(0x01, 0x11, 0x11);

/// Default address of the object-storage contract.
pub const OBJECT_STORAGE_ADDRESS: Address = reserved_address(0x01, 0x11, 0x10);

/// Default address of the cross-chain bridge route table.
pub const BRIDGE_ADDRESS: Address = reserved_address(0x01, 0x11, 0x01);

/// Default length key of the system buffer; its hash is the chunk base.
pub const SYSTEM_BUFFER_CACHE_KEY: &str = "SystemBufferCacheKey";

/// Default bytes moved per step between an object and the buffer.
pub const DEFAULT_COPY_CHUNK_SIZE: usize = 4096;

const fn reserved_address(b17: u8, b18: u8, b19: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[17] = b17;
    bytes[18] = b18;
    bytes[19] = b19;
    Address::new(bytes)
}

/// Complete system-contract configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SystemContractsConfig {
    /// Address of the system buffer contract.
    #[serde(deserialize_with = "deserialize_address")]
    pub buffer_address: Address,
    /// Address of the object-storage contract.
    #[serde(deserialize_with = "deserialize_address")]
    pub object_storage_address: Address,
    /// Address of the cross-chain bridge route table.
    #[serde(deserialize_with = "deserialize_address")]
    pub bridge_address: Address,
    /// Buffer engine settings.
    pub buffer: BufferConfig,
    /// Object-storage contract settings.
    pub object_storage: ObjectStorageConfig,
}

impl Default for SystemContractsConfig {
    fn default() -> Self {
        Self {
            buffer_address: SYSTEM_BUFFER_ADDRESS,
            object_storage_address: OBJECT_STORAGE_ADDRESS,
            bridge_address: BRIDGE_ADDRESS,
            buffer: BufferConfig::default(),
            object_storage: ObjectStorageConfig::default(),
        }
    }
}

/// Buffer engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Raw bytes of this string are the length key; its Keccak-256 hash is
    /// the base of the chunk keys.
    pub cache_key: String,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            cache_key: SYSTEM_BUFFER_CACHE_KEY.to_string(),
        }
    }
}

/// Object-storage contract settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    /// Bytes moved per read when streaming an object into the buffer.
    pub copy_chunk_size: usize,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            copy_chunk_size: DEFAULT_COPY_CHUNK_SIZE,
        }
    }
}

impl SystemContractsConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// `Parse` for malformed TOML or addresses; see [`Self::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that addresses are distinct and the copy size is usable.
    ///
    /// # Errors
    ///
    /// `DuplicateAddress` or `ZeroCopySize`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_address == self.object_storage_address
            || self.buffer_address == self.bridge_address
        {
            return Err(ConfigError::DuplicateAddress(self.buffer_address));
        }
        if self.object_storage_address == self.bridge_address {
            return Err(ConfigError::DuplicateAddress(self.bridge_address));
        }
        if self.object_storage.copy_chunk_size == 0 {
            return Err(ConfigError::ZeroCopySize);
        }
        Ok(())
    }
}

/// Parses a hex address, with or without `0x`.
///
/// # Errors
///
/// `InvalidAddress` if the string is not at most 20 bytes of hex.
pub fn parse_address(s: &str) -> Result<Address, ConfigError> {
    Address::from_hex(s.trim()).ok_or_else(|| ConfigError::InvalidAddress(s.to_string()))
}

fn deserialize_address<'de, D>(deserializer: D) -> Result<Address, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_address(&raw).map_err(serde::de::Error::custom)
}

// =============================================================================
// TESTS
// =============================================================================
