//! Transport façade and the generic resource service built on top of it.
//!
//! # Design
//! The core never performs I/O itself. A `Transport` is whatever the host
//! uses to move bytes (a blocking HTTP agent, a test double, an FFI
//! callback); `Service` only sequences build → execute → parse for one
//! resource type and returns the decoded value wrapped in a `Response`
//! with the status and headers. Neither holds state between calls, so a `Service` is as
//! thread-safe as the transport it borrows.

use std::marker::PhantomData;

use tracing::debug;

use crate::client::BillingClient;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse, Params, Response};
use crate::resource::Resource;

/// Executes one request/response exchange.
///
/// Implementations own connection handling, timeouts and cancellation and
/// report them as `TransportError`. Concurrent calls must not share request
/// or response buffers.
pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// CRUD operations on `R`, each a single exchange through `T`.
pub struct Service<'a, R, T: ?Sized> {
    client: &'a BillingClient,
    transport: &'a T,
    _resource: PhantomData<fn() -> R>,
}

impl<'a, R, T: ?Sized> Clone for Service<'a, R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, R, T: ?Sized> Copy for Service<'a, R, T> {}

impl<'a, R: Resource, T: Transport + ?Sized> Service<'a, R, T> {
    pub fn new(client: &'a BillingClient, transport: &'a T) -> Self {
        Self {
            client,
            transport,
            _resource: PhantomData,
        }
    }

    fn execute<V>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(HttpResponse) -> Result<V, ApiError>,
    ) -> Result<Response<V>, ApiError> {
        let method = request.method;
        let mut response = self.transport.execute(request)?;
        debug!(
            resource = R::SEGMENT,
            method = method.as_str(),
            status = response.status,
            "exchange complete"
        );
        let status = response.status;
        let headers = std::mem::take(&mut response.headers);
        let data = parse(response)?;
        Ok(Response {
            status,
            headers,
            data,
        })
    }

    pub fn list(&self, parent_code: &str, params: &Params) -> Result<Response<Vec<R>>, ApiError> {
        self.execute(self.client.build_list::<R>(parent_code, params), |r| {
            self.client.parse_list(r)
        })
    }

    pub fn get(&self, parent_code: &str, code: &str) -> Result<Response<R>, ApiError> {
        self.execute(self.client.build_get::<R>(parent_code, code), |r| {
            self.client.parse_get(r)
        })
    }

    /// Fields left `Absent` may come back populated with server defaults.
    pub fn create(&self, parent_code: &str, record: &R) -> Result<Response<R>, ApiError> {
        self.execute(self.client.build_create(parent_code, record)?, |r| {
            self.client.parse_create(r)
        })
    }

    /// `Absent` fields are left untouched, `Null` fields are cleared and
    /// `Present` fields overwrite the stored value.
    pub fn update(&self, parent_code: &str, code: &str, record: &R) -> Result<Response<R>, ApiError> {
        self.execute(self.client.build_update(parent_code, code, record)?, |r| {
            self.client.parse_update(r)
        })
    }

    pub fn delete(&self, parent_code: &str, code: &str) -> Result<Response<()>, ApiError> {
        self.execute(self.client.build_delete::<R>(parent_code, code), |r| {
            self.client.parse_delete(r)
        })
    }
}
