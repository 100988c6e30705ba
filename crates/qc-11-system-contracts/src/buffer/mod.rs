//! # System Buffer
//!
//! Append-only byte stream persisted as fixed 256-byte chunks in a
//! key-value repository.
//!
//! ## Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | raw bytes of the cache key | stream length, 8 bytes big-endian |
//! | `pad32(keccak256(cache key) + i)` | chunk `i`: logical bytes `[i*256, (i+1)*256)` |
//!
//! Chunks are always stored 256 bytes wide; only the bytes below the
//! recorded length are meaningful. The length key is the single source of
//! truth for the stream size.
//!
//! ## Failure Mode
//!
//! `write` and `close` issue several independent repository calls. A fault
//! between two of them leaves the chunk set and the length out of step;
//! nothing here rolls that back. A failed `write` leaves the length where it
//! was, so the next write overwrites from there; chunks stored past the
//! recorded length are never freed by `close`. Callers sharing one buffer
//! must serialize access to it.

pub mod contract;
pub mod stream;

pub use contract::BufferContract;
pub use stream::BufferStream;

use crate::config::{BufferConfig, SYSTEM_BUFFER_ADDRESS};
use crate::domain::services::{keccak256, offset_key};
use crate::domain::value_objects::{Address, Hash, EVM_WORD_SIZE};
use crate::errors::{BufferError, RepositoryError};
use crate::ports::outbound::KeyValueRepository;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Width of one persisted chunk.
pub const CHUNK_SIZE: u64 = 256;

const CHUNK_WIDTH: usize = CHUNK_SIZE as usize;

/// Chunked byte stream over a key-value repository.
pub struct SystemBuffer {
    address: Address,
    repository: Arc<dyn KeyValueRepository>,
    length_key: Vec<u8>,
    chunk_base: Hash,
}

impl SystemBuffer {
    /// Creates a buffer served at `address` using the keys derived from `config`.
    #[must_use]
    pub fn new(
        address: Address,
        repository: Arc<dyn KeyValueRepository>,
        config: &BufferConfig,
    ) -> Self {
        Self {
            address,
            repository,
            length_key: config.cache_key.as_bytes().to_vec(),
            chunk_base: keccak256(config.cache_key.as_bytes()),
        }
    }

    /// Buffer at the default address with the default cache key.
    #[must_use]
    pub fn with_defaults(repository: Arc<dyn KeyValueRepository>) -> Self {
        Self::new(SYSTEM_BUFFER_ADDRESS, repository, &BufferConfig::default())
    }

    /// Address of the contract serving this buffer.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Repository key holding the stream length.
    #[must_use]
    pub fn length_key(&self) -> &[u8] {
        &self.length_key
    }

    /// Repository key of chunk `index`.
    #[must_use]
    pub fn chunk_key(&self, index: u64) -> [u8; EVM_WORD_SIZE] {
        offset_key(&self.chunk_base, index)
    }

    /// Current stream length. Absent or unreadable length reads as 0.
    #[must_use]
    pub fn length(&self) -> u64 {
        match self.stored_length() {
            Ok(length) => length.unwrap_or(0),
            Err(err) => {
                warn!(buffer = %self.address, error = %err, "unreadable buffer length, reporting 0");
                0
            }
        }
    }

    /// Reads `size` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// - `InvalidReadPosition` if no length is recorded or `offset + size` exceeds it
    /// - `MissingChunk` / `CorruptChunk` if a chunk inside the range is unusable
    /// - `Repository` for failures of the underlying store
    pub fn read(&self, offset: u64, size: u64) -> Result<Vec<u8>, BufferError> {
        let invalid = |length| BufferError::InvalidReadPosition {
            offset,
            size,
            length,
        };
        let length = self.stored_length()?.ok_or_else(|| invalid(0))?;
        match offset.checked_add(size) {
            Some(end) if end <= length => {}
            _ => return Err(invalid(length)),
        }

        let prefix = (offset % CHUNK_SIZE) as usize;
        let wanted = usize::try_from(size)
            .ok()
            .and_then(|size| size.checked_add(prefix))
            .ok_or_else(|| invalid(length))?;

        let mut data = Vec::with_capacity(wanted);
        let mut index = offset / CHUNK_SIZE;
        while data.len() < wanted {
            data.extend_from_slice(&self.load_chunk(index)?);
            index += 1;
        }
        data.truncate(wanted);
        data.drain(..prefix);

        debug!(buffer = %self.address, offset, size, length, "buffer read");
        Ok(data)
    }

    /// Appends `data` and returns the number of bytes written.
    ///
    /// A partially filled last chunk is topped up first; the remainder goes
    /// into fresh chunks. The length is updated last.
    ///
    /// # Errors
    ///
    /// `Repository` on store failure, `MissingChunk` / `CorruptChunk` if the
    /// partially filled chunk cannot be loaded.
    pub fn write(&self, data: &[u8]) -> Result<u64, BufferError> {
        if data.is_empty() {
            return Ok(0);
        }
        let current = self.stored_length()?.unwrap_or(0);
        let mut index = current / CHUNK_SIZE;
        let mut rest = data;

        let pre_reserve = (current % CHUNK_SIZE) as usize;
        if pre_reserve != 0 {
            let mut chunk = self.load_chunk(index)?;
            let take = rest.len().min(CHUNK_WIDTH - pre_reserve);
            chunk[pre_reserve..pre_reserve + take].copy_from_slice(&rest[..take]);
            self.repository.put(&self.chunk_key(index), &chunk)?;
            rest = &rest[take..];
            index += 1;
        }

        for piece in rest.chunks(CHUNK_WIDTH) {
            let mut chunk = piece.to_vec();
            chunk.resize(CHUNK_WIDTH, 0);
            self.repository.put(&self.chunk_key(index), &chunk)?;
            index += 1;
        }

        let written = data.len() as u64;
        let new_length = current + written;
        self.repository
            .put(&self.length_key, &new_length.to_be_bytes())?;

        debug!(buffer = %self.address, written, new_length, "buffer write");
        Ok(written)
    }

    /// Frees the whole stream: the length key, then chunks `0..=length/256`.
    ///
    /// The upper bound is inclusive, so when the length is an exact multiple
    /// of the chunk size one never-written slot is deleted as well. Off-chain
    /// storage accounting relies on this count; keep it.
    ///
    /// # Errors
    ///
    /// `Repository` if any delete fails.
    pub fn close(&self) -> Result<(), BufferError> {
        let length = self.stored_length()?.unwrap_or(0);
        if length == 0 {
            return Ok(());
        }

        self.repository.delete(&self.length_key)?;
        for index in 0..=length / CHUNK_SIZE {
            self.repository.delete(&self.chunk_key(index))?;
        }

        debug!(buffer = %self.address, freed = length, "buffer closed");
        Ok(())
    }

    fn stored_length(&self) -> Result<Option<u64>, BufferError> {
        let Some(raw) = self.repository.get(&self.length_key)? else {
            return Ok(None);
        };
        let bytes = <[u8; 8]>::try_from(raw.as_slice()).map_err(|_| RepositoryError::Corruption {
            message: format!("buffer length record is {} bytes", raw.len()),
        })?;
        Ok(Some(u64::from_be_bytes(bytes)))
    }

    fn load_chunk(&self, index: u64) -> Result<Vec<u8>, BufferError> {
        match self.repository.get(&self.chunk_key(index))? {
            None => Err(BufferError::MissingChunk { index }),
            Some(chunk) if chunk.is_empty() => Err(BufferError::MissingChunk { index }),
            Some(chunk) if chunk.len() != CHUNK_WIDTH => Err(BufferError::CorruptChunk {
                index,
                len: chunk.len(),
            }),
            Some(chunk) => Ok(chunk),
        }
    }
}

impl fmt::Debug for SystemBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemBuffer")
            .field("address", &self.address)
            .field("chunk_base", &self.chunk_base)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRepository;

    fn buffer() -> (Arc<InMemoryRepository>, SystemBuffer) {
        let repo = Arc::new(InMemoryRepository::new());
        let buffer = SystemBuffer::with_defaults(repo.clone());
        (repo, buffer)
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_empty_buffer() {
        let (_, buffer) = buffer();
        assert_eq!(buffer.length(), 0);
        assert_eq!(
            buffer.read(0, 1),
            Err(BufferError::InvalidReadPosition {
                offset: 0,
                size: 1,
                length: 0,
            })
        );
    }

    #[test]
    fn test_write_then_read_small() {
        let (_, buffer) = buffer();
        assert_eq!(buffer.write(&[0x11, 0x11, 0x11]).unwrap(), 3);
        assert_eq!(buffer.length(), 3);
        assert_eq!(buffer.read(0, 3).unwrap(), vec![0x11, 0x11, 0x11]);
        assert_eq!(buffer.read(1, 2).unwrap(), vec![0x11, 0x11]);
    }

    #[test]
    fn test_read_tail_of_259_bytes() {
        let (_, buffer) = buffer();
        let data = pattern(259);
        buffer.write(&data).unwrap();
        assert_eq!(buffer.read(257, 2).unwrap(), data[257..259].to_vec());
    }

    #[test]
    fn test_read_across_chunk_boundary() {
        let (_, buffer) = buffer();
        let data = pattern(600);
        buffer.write(&data).unwrap();
        assert_eq!(buffer.read(250, 20).unwrap(), data[250..270].to_vec());
        assert_eq!(buffer.read(0, 600).unwrap(), data);
        assert_eq!(buffer.read(511, 2).unwrap(), data[511..513].to_vec());
    }

    #[test]
    fn test_read_past_length_fails() {
        let (_, buffer) = buffer();
        buffer.write(&pattern(10)).unwrap();
        assert!(matches!(
            buffer.read(5, 6),
            Err(BufferError::InvalidReadPosition { length: 10, .. })
        ));
        assert!(matches!(
            buffer.read(u64::MAX, 2),
            Err(BufferError::InvalidReadPosition { .. })
        ));
    }

    #[test]
    fn test_zero_size_read_at_end() {
        let (_, buffer) = buffer();
        buffer.write(&pattern(300)).unwrap();
        assert_eq!(buffer.read(300, 0).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_appends_top_up_partial_chunk() {
        let (repo, buffer) = buffer();
        let data = pattern(700);
        // 250 + 10 crosses into chunk 1, then 440 more spans chunks 1 and 2
        buffer.write(&data[..250]).unwrap();
        buffer.write(&data[250..260]).unwrap();
        buffer.write(&data[260..]).unwrap();

        assert_eq!(buffer.length(), 700);
        assert_eq!(buffer.read(0, 700).unwrap(), data);
        assert_eq!(repo.len(), 1 + 3);

        let chunk0 = repo.get(&buffer.chunk_key(0)).unwrap().unwrap();
        assert_eq!(chunk0, data[..256].to_vec());
    }

    #[test]
    fn test_chunks_are_stored_full_width() {
        let (repo, buffer) = buffer();
        buffer.write(&[0xaa; 3]).unwrap();
        let chunk = repo.get(&buffer.chunk_key(0)).unwrap().unwrap();
        assert_eq!(chunk.len(), 256);
        assert_eq!(&chunk[..3], &[0xaa; 3]);
        assert!(chunk[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_length_record_is_big_endian_u64() {
        let (repo, buffer) = buffer();
        buffer.write(&pattern(259)).unwrap();
        let raw = repo.get(b"SystemBufferCacheKey").unwrap().unwrap();
        assert_eq!(raw, 259u64.to_be_bytes().to_vec());
    }

    #[test]
    fn test_empty_write_touches_nothing() {
        let (repo, buffer) = buffer();
        assert_eq!(buffer.write(&[]).unwrap(), 0);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_close_frees_everything() {
        let (repo, buffer) = buffer();
        buffer.write(&pattern(300)).unwrap();
        buffer.close().unwrap();
        assert_eq!(buffer.length(), 0);
        assert!(repo.is_empty());
        assert!(buffer.read(0, 1).is_err());

        buffer.write(&[1, 2]).unwrap();
        assert_eq!(buffer.read(0, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_close_empty_is_noop() {
        let (_, buffer) = buffer();
        assert!(buffer.close().is_ok());
    }

    #[test]
    fn test_missing_chunk_is_reported() {
        let (repo, buffer) = buffer();
        buffer.write(&pattern(300)).unwrap();
        repo.delete(&buffer.chunk_key(1)).unwrap();
        assert_eq!(buffer.read(250, 20), Err(BufferError::MissingChunk { index: 1 }));
    }

    #[test]
    fn test_corrupt_chunk_is_reported() {
        let (repo, buffer) = buffer();
        buffer.write(&pattern(10)).unwrap();
        repo.put(&buffer.chunk_key(0), &[1, 2, 3]).unwrap();
        assert_eq!(
            buffer.read(0, 1),
            Err(BufferError::CorruptChunk { index: 0, len: 3 })
        );
    }

    #[test]
    fn test_malformed_length_reads_as_zero_but_blocks_read() {
        let (repo, buffer) = buffer();
        repo.put(b"SystemBufferCacheKey", &[1, 2, 3]).unwrap();
        assert_eq!(buffer.length(), 0);
        assert!(matches!(
            buffer.read(0, 0),
            Err(BufferError::Repository(RepositoryError::Corruption { .. }))
        ));
    }

    #[test]
    fn test_malformed_length_fails_write_and_close() {
        let (repo, buffer) = buffer();
        repo.put(b"SystemBufferCacheKey", &[1, 2, 3]).unwrap();
        assert!(matches!(
            buffer.write(b"x"),
            Err(BufferError::Repository(RepositoryError::Corruption { .. }))
        ));
        assert!(matches!(
            buffer.close(),
            Err(BufferError::Repository(RepositoryError::Corruption { .. }))
        ));
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_interrupted_write_leaves_orphan_chunks() {
        let (repo, buffer) = buffer();
        // 600 bytes need chunks 0, 1, 2 and then the length; the third put fails
        repo.set_fail_after_puts(Some(2));
        assert!(matches!(
            buffer.write(&[7; 600]),
            Err(BufferError::Repository(RepositoryError::Io { .. }))
        ));
        assert_eq!(buffer.length(), 0);
        assert!(repo.contains(&buffer.chunk_key(0)));
        assert!(repo.contains(&buffer.chunk_key(1)));
        assert!(!repo.contains(&buffer.chunk_key(2)));
        assert!(!repo.contains(b"SystemBufferCacheKey"));

        // the next write starts again from the recorded length
        repo.set_fail_after_puts(None);
        assert_eq!(buffer.write(&[1; 10]).unwrap(), 10);
        assert_eq!(buffer.length(), 10);
        assert_eq!(buffer.read(0, 10).unwrap(), vec![1; 10]);

        // close only frees slots up to the recorded length, chunk 1 stays behind
        buffer.close().unwrap();
        assert_eq!(repo.len(), 1);
        assert!(repo.contains(&buffer.chunk_key(1)));
    }

    #[test]
    fn test_custom_cache_key_isolates_streams() {
        let repo = Arc::new(InMemoryRepository::new());
        let a = SystemBuffer::with_defaults(repo.clone());
        let b = SystemBuffer::new(
            SYSTEM_BUFFER_ADDRESS,
            repo.clone(),
            &BufferConfig {
                cache_key: "OtherBuffer".to_string(),
            },
        );
        a.write(b"aaa").unwrap();
        b.write(b"bbbbb").unwrap();
        assert_eq!(a.length(), 3);
        assert_eq!(b.read(0, 5).unwrap(), b"bbbbb".to_vec());
    }
}
