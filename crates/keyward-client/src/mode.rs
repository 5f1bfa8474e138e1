//! Installing and removing the authentication pipeline.
//!
//! The pipeline is one request interceptor plus one response interceptor.
//! They are registered and ejected together under the mode lock, so a
//! client is either fully attached or fully detached.

use std::sync::Arc;

use crate::client::AuthenticatedClient;
use crate::interceptor::InterceptorId;
use crate::policy::{JwtRequestInterceptor, JwtResponseInterceptor};

/// Whether the authentication pipeline is installed, and under which ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeHandle {
    #[default]
    Detached,
    Attached {
        request: InterceptorId,
        response: InterceptorId,
    },
}

impl ModeHandle {
    pub fn is_attached(&self) -> bool {
        matches!(self, ModeHandle::Attached { .. })
    }

    /// `(request, response)` interceptor ids when attached.
    pub fn ids(&self) -> Option<(InterceptorId, InterceptorId)> {
        match *self {
            ModeHandle::Attached { request, response } => Some((request, response)),
            ModeHandle::Detached => None,
        }
    }
}

impl AuthenticatedClient {
    /// Current pipeline handle.
    pub fn mode(&self) -> ModeHandle {
        *self.mode_handle().lock()
    }

    /// Install the pipeline. No-op when already attached.
    pub fn enable(&self) {
        let mut mode = self.mode_handle().lock();
        if mode.is_attached() {
            return;
        }

        let mut interceptors = self.interceptors().write();
        let request = interceptors
            .request
            .register(Arc::new(JwtRequestInterceptor));
        let response = interceptors
            .response
            .register(Arc::new(JwtResponseInterceptor));
        *mode = ModeHandle::Attached { request, response };
        tracing::debug!(?request, ?response, "JWT mode enabled");
    }

    /// Remove the pipeline. No-op when already detached.
    pub fn disable(&self) {
        let mut mode = self.mode_handle().lock();
        let Some((request, response)) = mode.ids() else {
            return;
        };

        let mut interceptors = self.interceptors().write();
        interceptors.request.eject(request);
        interceptors.response.eject(response);
        *mode = ModeHandle::Detached;
        tracing::debug!("JWT mode disabled");
    }

    /// `enable()` when `true`, `disable()` when `false`.
    pub fn set_mode(&self, enabled: bool) {
        if enabled {
            self.enable();
        } else {
            self.disable();
        }
    }
}
