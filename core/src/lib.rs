//! Synchronous API client core for the billing service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Request and response bodies
//! are XML; fields that must distinguish "leave alone" from "clear" use the
//! three-state `Nullable` codec so partial updates survive the wire.
//!
//! # Design
//! - `BillingClient` is stateless: it holds only `base_url`.
//! - Each CRUD operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), generic over `R: Resource`.
//! - `Service` runs build → `Transport::execute` → parse for hosts that
//!   provide a transport and hands back the status and headers with the
//!   decoded value; no retries, no caching.
//! - The mock server stores raw elements rather than these record types;
//!   integration tests catch schema drift between the two.

pub mod client;
pub mod error;
pub mod http;
pub mod nullable;
pub mod resource;
pub mod transport;
pub mod types;
pub mod unit_amount;
pub mod xml;

pub use client::BillingClient;
pub use error::{ApiError, CodecError, CodecErrorKind, TransportError, ValidationError, ValidationErrors};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Params, Response};
pub use nullable::{NullBool, NullInt, NullTime, Nullable};
pub use resource::Resource;
pub use transport::{Service, Transport};
pub use types::AddOn;
pub use unit_amount::UnitAmount;
pub use xml::{parse_document, Element};
