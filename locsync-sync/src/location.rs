//! Location capability: availability queries and the copy primitive.
//!
//! A [`LocationHandle`] pairs catalog metadata with an optional [`Accessor`].
//! Without an accessor the location is unreachable and every query fails with
//! [`TransferError::Unreachable`].

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use locsync_core::types::{Component, Location, LocationId, LocationName};

use crate::error::TransferError;

/// Storage backend of a location.
pub trait Accessor: Send + Sync {
    /// Percentage (0–100) of the component's content present here.
    fn availability(&self, component: &Component) -> Result<f64, TransferError>;

    /// Full content of the component.
    fn fetch(&self, component: &Component) -> Result<Vec<u8>, TransferError>;

    /// SHA-256 hex digest of the stored content, `None` when absent.
    fn digest(&self, component: &Component) -> Result<Option<String>, TransferError>;

    /// Store the component's full content, replacing anything partial.
    fn store(&self, component: &Component, data: &[u8]) -> Result<(), TransferError>;
}

/// SHA-256 hex digest used as content identity.
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A resolved location: metadata plus reachability.
#[derive(Clone)]
pub struct LocationHandle {
    location: Location,
    accessor: Option<Arc<dyn Accessor>>,
}

impl fmt::Debug for LocationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationHandle")
            .field("location", &self.location)
            .field("reachable", &self.is_reachable())
            .finish()
    }
}

impl LocationHandle {
    pub fn new(location: Location, accessor: Option<Arc<dyn Accessor>>) -> Self {
        Self { location, accessor }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn id(&self) -> &LocationId {
        &self.location.id
    }

    pub fn name(&self) -> &LocationName {
        &self.location.name
    }

    pub fn is_reachable(&self) -> bool {
        self.accessor.is_some()
    }

    fn accessor(&self) -> Result<&Arc<dyn Accessor>, TransferError> {
        self.accessor.as_ref().ok_or_else(|| TransferError::Unreachable {
            location: self.location.name.0.clone(),
        })
    }

    pub fn get_component_availability(&self, component: &Component) -> Result<f64, TransferError> {
        self.accessor()?.availability(component)
    }

    /// Copy `component` from `source` into this location.
    ///
    /// Fails with [`TransferError::AlreadyPresent`] when the content here is
    /// byte-identical to the source, without writing anything.
    pub fn add_component(
        &self,
        component: &Component,
        source: &LocationHandle,
    ) -> Result<(), TransferError> {
        let target = self.accessor()?;
        let origin = source.accessor()?;

        let data = origin.fetch(component)?;
        let digest = content_digest(&data);
        if target.digest(component)?.as_deref() == Some(digest.as_str()) {
            return Err(TransferError::AlreadyPresent {
                component: component.name.clone(),
                location: self.location.name.0.clone(),
            });
        }

        target.store(component, &data)?;
        tracing::debug!(
            "stored {} ({} bytes, sha256 {}) in {}",
            component.name,
            data.len(),
            digest,
            self.location.name
        );
        Ok(())
    }
}
