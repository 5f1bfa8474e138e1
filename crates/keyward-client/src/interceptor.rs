//! Interceptor traits and registries.
//!
//! Request interceptors run in registration order before the transport is
//! called; response interceptors run in registration order afterwards. A
//! failure anywhere is handed to the `on_error` of every remaining response
//! interceptor, any of which may recover it into a response.

use std::sync::Arc;

use async_trait::async_trait;

use crate::client::AuthenticatedClient;
use crate::error::{Error, Result};
use crate::types::{RequestConfig, Response};

/// Identifier returned when an interceptor is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterceptorId(u64);

impl InterceptorId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Rewrites or rejects an outgoing request.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(
        &self,
        client: &AuthenticatedClient,
        request: RequestConfig,
    ) -> Result<RequestConfig>;
}

/// Observes the outcome of a request.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Called with a successful response.
    async fn on_response(
        &self,
        _client: &AuthenticatedClient,
        response: Response,
    ) -> Result<Response> {
        Ok(response)
    }

    /// Called with a failure. `request` is the request as last seen by the
    /// pipeline.
    async fn on_error(
        &self,
        _client: &AuthenticatedClient,
        _request: &RequestConfig,
        error: Error,
    ) -> Result<Response> {
        Err(error)
    }
}

/// An ordered set of interceptors addressable by id.
pub struct InterceptorRegistry<T: ?Sized> {
    next_id: u64,
    entries: Vec<(InterceptorId, Arc<T>)>,
}

impl<T: ?Sized> InterceptorRegistry<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Append a handler. Ids are never reused.
    pub fn register(&mut self, handler: Arc<T>) -> InterceptorId {
        let id = InterceptorId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, handler));
        id
    }

    /// Remove a handler. Returns `false` for unknown ids.
    pub fn eject(&mut self, id: InterceptorId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: InterceptorId) -> bool {
        self.entries.iter().any(|(entry, _)| *entry == id)
    }

    pub fn ids(&self) -> Vec<InterceptorId> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.entries
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }
}

impl<T: ?Sized> Default for InterceptorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Request and response registries of one client.
#[derive(Default)]
pub(crate) struct Interceptors {
    pub(crate) request: InterceptorRegistry<dyn RequestInterceptor>,
    pub(crate) response: InterceptorRegistry<dyn ResponseInterceptor>,
}
