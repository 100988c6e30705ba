//! Buffer contract: exposes a [`SystemBuffer`] through four ABI methods.
//!
//! | Method | Outputs |
//! |--------|---------|
//! | `Read(uint64,uint64)` | `bytes` |
//! | `Write(bytes)` | `uint64` |
//! | `Length()` | `uint64` |
//! | `Close()` | none |

use super::SystemBuffer;
use crate::codec::ArgKind;
use crate::domain::value_objects::Address;
use crate::ports::inbound::SystemContract;
use crate::router::Router;
use std::sync::Arc;

/// System contract serving the shared buffer.
#[derive(Debug, Clone)]
pub struct BufferContract {
    buffer: Arc<SystemBuffer>,
}

impl BufferContract {
    /// Wraps `buffer`; the contract address is the buffer's address.
    #[must_use]
    pub fn new(buffer: Arc<SystemBuffer>) -> Self {
        Self { buffer }
    }

    /// The buffer behind this contract.
    #[must_use]
    pub fn buffer(&self) -> &Arc<SystemBuffer> {
        &self.buffer
    }
}

impl SystemContract for BufferContract {
    fn address(&self) -> Address {
        self.buffer.address()
    }

    fn name(&self) -> &'static str {
        "system-buffer"
    }

    fn routes(self: Arc<Self>) -> Router {
        let mut router = Router::new(self.name());

        let buffer = Arc::clone(&self.buffer);
        router.register(
            "Read",
            &[ArgKind::UInt64, ArgKind::UInt64],
            &[ArgKind::Bytes],
            move |args| {
                let data = buffer.read(args.u64(0)?, args.u64(1)?)?;
                Ok(vec![data.into()])
            },
        );

        let buffer = Arc::clone(&self.buffer);
        router.register("Write", &[ArgKind::Bytes], &[ArgKind::UInt64], move |args| {
            let written = buffer.write(args.bytes(0)?)?;
            Ok(vec![written.into()])
        });

        let buffer = Arc::clone(&self.buffer);
        router.register("Length", &[], &[ArgKind::UInt64], move |_| {
            Ok(vec![buffer.length().into()])
        });

        let buffer = Arc::clone(&self.buffer);
        router.register("Close", &[], &[], move |_| {
            buffer.close()?;
            Ok(vec![])
        });

        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRepository;
    use crate::codec::{encode_return_value, AbiValue};
    use crate::domain::services::{compute_selector, u64_word};
    use crate::errors::{BufferError, ContractError, DispatchError};
    use crate::ports::outbound::KeyValueRepository;

    fn setup() -> (Arc<InMemoryRepository>, Router) {
        let repo = Arc::new(InMemoryRepository::new());
        let buffer = Arc::new(SystemBuffer::with_defaults(repo.clone()));
        let router = Arc::new(BufferContract::new(buffer)).routes();
        (repo, router)
    }

    fn call(signature: &str, args: &[AbiValue]) -> Vec<u8> {
        let mut input = compute_selector(signature).as_bytes().to_vec();
        input.extend(encode_return_value(args));
        input
    }

    #[test]
    fn test_selectors() {
        let (_, router) = setup();
        assert_eq!(router.len(), 4);
        for hex in ["ae0bf883", "5f10585d", "82172882", "c35789cc"] {
            let bytes = hex::decode(hex).unwrap();
            let selector = crate::domain::value_objects::Selector::split(&bytes).unwrap().0;
            assert!(router.route(&selector).is_some(), "missing route {hex}");
        }
    }

    #[test]
    fn test_read_encodes_bytes() {
        let (repo, router) = setup();
        let buffer = SystemBuffer::with_defaults(repo.clone());
        repo.put(b"SystemBufferCacheKey", &3u64.to_be_bytes()).unwrap();
        let mut chunk = vec![0x11; 3];
        chunk.resize(256, 0);
        repo.put(&buffer.chunk_key(0), &chunk).unwrap();

        let out = router
            .dispatch(&call("Read(uint64,uint64)", &[0u64.into(), 3u64.into()]))
            .unwrap();

        let mut expected = u64_word(0x20).to_vec();
        expected.extend(u64_word(3));
        expected.extend([0x11, 0x11, 0x11]);
        expected.resize(96, 0);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_length_of_missing_buffer_is_zero_word() {
        let (_, router) = setup();
        let out = router.dispatch(&call("Length()", &[])).unwrap();
        assert_eq!(out, vec![0u8; 32]);
    }

    #[test]
    fn test_write_length_close() {
        let (repo, router) = setup();
        let out = router
            .dispatch(&call("Write(bytes)", &[vec![7u8; 300].into()]))
            .unwrap();
        assert_eq!(out, u64_word(300).to_vec());

        let out = router.dispatch(&call("Length()", &[])).unwrap();
        assert_eq!(out, u64_word(300).to_vec());

        let out = router.dispatch(&call("Close()", &[])).unwrap();
        assert!(out.is_empty());
        assert!(repo.is_empty());
    }

    #[test]
    fn test_read_out_of_range_is_business_error() {
        let (_, router) = setup();
        let err = router
            .dispatch(&call("Read(uint64,uint64)", &[0u64.into(), 1u64.into()]))
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Handler(ContractError::Buffer(BufferError::InvalidReadPosition {
                offset: 0,
                size: 1,
                length: 0,
            }))
        );
    }
}
