//! # Object-Storage Contract
//!
//! Moves whole objects between a cloud bucket and the system buffer, so
//! contract code can work on large blobs through `Read`/`Write` calls on the
//! buffer contract.
//!
//! | Method | Outputs |
//! |--------|---------|
//! | `GetObject(string,string)` | `address` of the buffer contract |
//! | `PutObject(string,string)` | `(etag, version_id, encryption_alg)` |

use crate::buffer::{BufferStream, SystemBuffer};
use crate::codec::ArgKind;
use crate::config::ObjectStorageConfig;
use crate::domain::value_objects::Address;
use crate::errors::{ContractError, ObjectStoreError};
use crate::ports::inbound::SystemContract;
use crate::ports::outbound::{ObjectMeta, ObjectStore};
use crate::router::Router;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Object-storage system contract.
pub struct ObjectStorageContract {
    address: Address,
    store: Arc<dyn ObjectStore>,
    buffer: Arc<SystemBuffer>,
    copy_chunk_size: usize,
}

impl ObjectStorageContract {
    /// Creates the contract at `address`, staging data through `buffer`.
    #[must_use]
    pub fn new(
        address: Address,
        store: Arc<dyn ObjectStore>,
        buffer: Arc<SystemBuffer>,
        config: &ObjectStorageConfig,
    ) -> Self {
        Self {
            address,
            store,
            buffer,
            copy_chunk_size: config.copy_chunk_size.max(1),
        }
    }

    /// Downloads object `name` and appends it to the buffer.
    ///
    /// Returns the buffer contract's address, where the caller reads the data.
    ///
    /// # Errors
    ///
    /// Object-store errors from the fetch, `ObjectStore(Io)` if the body
    /// fails mid-read, buffer errors from the append.
    #[instrument(skip(self), fields(contract = %self.address))]
    pub fn get_object(&self, bucket_url: &str, name: &str) -> Result<Address, ContractError> {
        let mut body = self.store.get_object(bucket_url, name)?;
        let mut chunk = vec![0u8; self.copy_chunk_size];
        let mut total = 0u64;
        loop {
            let read = match body.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ObjectStoreError::Io(e.to_string()).into()),
            };
            total += self.buffer.write(&chunk[..read])?;
        }
        debug!(bytes = total, "object copied into buffer");
        Ok(self.buffer.address())
    }

    /// Uploads the buffer's content as object `name`.
    ///
    /// # Errors
    ///
    /// Whatever the object store reports, including buffer read failures
    /// surfacing through the upload body.
    #[instrument(skip(self), fields(contract = %self.address))]
    pub fn put_object(&self, bucket_url: &str, name: &str) -> Result<ObjectMeta, ContractError> {
        let mut body = CappedReader {
            inner: BufferStream::new(Arc::clone(&self.buffer)),
            max: self.copy_chunk_size,
        };
        let meta = self.store.put_object(bucket_url, name, &mut body)?;
        debug!(bytes = body.inner.position(), etag = %meta.etag, "buffer uploaded");
        Ok(meta)
    }
}

/// Hands out at most `max` bytes per `read`, whatever the caller asks for.
struct CappedReader<R> {
    inner: R,
    max: usize,
}

impl<R: Read> Read for CappedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(self.max);
        self.inner.read(&mut buf[..len])
    }
}

impl SystemContract for ObjectStorageContract {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &'static str {
        "object-storage"
    }

    fn routes(self: Arc<Self>) -> Router {
        let mut router = Router::new(self.name());

        let contract = Arc::clone(&self);
        router.register(
            "GetObject",
            &[ArgKind::String, ArgKind::String],
            &[ArgKind::Address],
            move |args| {
                let address = contract.get_object(args.string(0)?, args.string(1)?)?;
                Ok(vec![address.into()])
            },
        );

        let contract = self;
        router.register(
            "PutObject",
            &[ArgKind::String, ArgKind::String],
            &[ArgKind::String, ArgKind::String, ArgKind::String],
            move |args| {
                let meta = contract.put_object(args.string(0)?, args.string(1)?)?;
                Ok(vec![
                    meta.etag.into(),
                    meta.version_id.into(),
                    meta.encryption_alg.into(),
                ])
            },
        );

        router
    }
}

// =============================================================================
// TESTS
// =============================================================================
