//! # In-Memory Object Store
//!
//! Buckets kept in a map keyed by bucket URL. Stands in for the cloud
//! object-storage client in tests.

use crate::domain::services::keccak256;
use crate::errors::ObjectStoreError;
use crate::ports::outbound::{ObjectMeta, ObjectStore};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// In-memory object store.
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    responses: RwLock<HashMap<(String, String), ObjectStoreError>>,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` as object `name` without going through `put_object`.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` if `bucket_url` is not an http(s) URL.
    pub fn insert(&self, bucket_url: &str, name: &str, data: Vec<u8>) -> Result<(), ObjectStoreError> {
        let bucket = validate_bucket_url(bucket_url)?;
        self.objects.write().insert((bucket, name.to_string()), data);
        Ok(())
    }

    /// Makes every request for object `name` fail with an error response
    /// carrying `code` and `message`, as the remote service would.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` if `bucket_url` is not an http(s) URL.
    pub fn set_error_response(
        &self,
        bucket_url: &str,
        name: &str,
        code: &str,
        message: &str,
    ) -> Result<(), ObjectStoreError> {
        let bucket = validate_bucket_url(bucket_url)?;
        let resource = format!("{bucket}/{name}");
        let request_id = hex::encode(&keccak256(resource.as_bytes()).as_bytes()[..8]);
        self.responses.write().insert(
            (bucket, name.to_string()),
            ObjectStoreError::Response {
                code: code.to_string(),
                message: message.to_string(),
                resource,
                request_id,
            },
        );
        Ok(())
    }

    fn check_response(&self, bucket: &str, name: &str) -> Result<(), ObjectStoreError> {
        match self.responses.read().get(&(bucket.to_string(), name.to_string())) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Contents of object `name`, if present.
    #[must_use]
    pub fn object(&self, bucket_url: &str, name: &str) -> Option<Vec<u8>> {
        let bucket = validate_bucket_url(bucket_url).ok()?;
        self.objects.read().get(&(bucket, name.to_string())).cloned()
    }
}

/// Accepts `http://host[/...]` and `https://host[/...]`; trailing slashes are dropped.
fn validate_bucket_url(bucket_url: &str) -> Result<String, ObjectStoreError> {
    let trimmed = bucket_url.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| ObjectStoreError::InvalidUrl(bucket_url.to_string()))?;
    if host.is_empty() || host.contains(char::is_whitespace) {
        return Err(ObjectStoreError::InvalidUrl(bucket_url.to_string()));
    }
    Ok(trimmed.to_string())
}

impl ObjectStore for InMemoryObjectStore {
    fn get_object(
        &self,
        bucket_url: &str,
        name: &str,
    ) -> Result<Box<dyn Read + Send>, ObjectStoreError> {
        let bucket = validate_bucket_url(bucket_url)?;
        self.check_response(&bucket, name)?;
        let data = self
            .objects
            .read()
            .get(&(bucket, name.to_string()))
            .cloned()
            .ok_or_else(|| ObjectStoreError::NotFound(name.to_string()))?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn put_object(
        &self,
        bucket_url: &str,
        name: &str,
        body: &mut dyn Read,
    ) -> Result<ObjectMeta, ObjectStoreError> {
        let bucket = validate_bucket_url(bucket_url)?;
        self.check_response(&bucket, name)?;
        let mut data = Vec::new();
        body.read_to_end(&mut data)
            .map_err(|e| ObjectStoreError::Io(e.to_string()))?;

        let etag = format!("\"{}\"", hex::encode(&keccak256(&data).as_bytes()[..16]));
        self.objects.write().insert((bucket, name.to_string()), data);
        Ok(ObjectMeta {
            etag,
            ..ObjectMeta::default()
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
