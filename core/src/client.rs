//! Stateless HTTP request builder and response parser for the billing API.
//!
//! # Design
//! `BillingClient` holds only a `base_url` and carries no mutable state
//! between calls. Each CRUD operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. Every method is generic over `R: Resource`, so the path
//! layout, body encoding and status handling are written once for all
//! resource types.

use tracing::{debug, warn};

use crate::error::{ApiError, ValidationError, ValidationErrors};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Params};
use crate::resource::{decode_list, decode_record, Resource};
use crate::transport::{Service, Transport};
use crate::types::AddOn;
use crate::xml::{parse_document, Element};

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const XML_ACCEPT: &str = "application/xml";

/// Synchronous, stateless client for the billing API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. The round-trip between `build_*` and `parse_*`
/// belongs to the caller, or to a `Transport` driven by `Service`.
#[derive(Debug, Clone)]
pub struct BillingClient {
    base_url: String,
}

impl BillingClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Operations on `R` executed through `transport`.
    pub fn service<'a, R: Resource, T: Transport + ?Sized>(
        &'a self,
        transport: &'a T,
    ) -> Service<'a, R, T> {
        Service::new(self, transport)
    }

    pub fn add_ons<'a, T: Transport + ?Sized>(&'a self, transport: &'a T) -> Service<'a, AddOn, T> {
        self.service(transport)
    }

    fn collection_path<R: Resource>(&self, parent_code: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            R::PARENT_SEGMENT,
            urlencoding::encode(parent_code),
            R::SEGMENT
        )
    }

    fn member_path<R: Resource>(&self, parent_code: &str, code: &str) -> String {
        format!(
            "{}/{}",
            self.collection_path::<R>(parent_code),
            urlencoding::encode(code)
        )
    }

    pub fn build_list<R: Resource>(&self, parent_code: &str, params: &Params) -> HttpRequest {
        let query = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        request(HttpMethod::Get, self.collection_path::<R>(parent_code), query, None)
    }

    pub fn build_get<R: Resource>(&self, parent_code: &str, code: &str) -> HttpRequest {
        request(HttpMethod::Get, self.member_path::<R>(parent_code, code), Vec::new(), None)
    }

    pub fn build_create<R: Resource>(
        &self,
        parent_code: &str,
        record: &R,
    ) -> Result<HttpRequest, ApiError> {
        let body = record.to_element()?.to_document()?;
        Ok(request(
            HttpMethod::Post,
            self.collection_path::<R>(parent_code),
            Vec::new(),
            Some(body),
        ))
    }

    pub fn build_update<R: Resource>(
        &self,
        parent_code: &str,
        code: &str,
        record: &R,
    ) -> Result<HttpRequest, ApiError> {
        let body = record.to_element()?.to_document()?;
        Ok(request(
            HttpMethod::Put,
            self.member_path::<R>(parent_code, code),
            Vec::new(),
            Some(body),
        ))
    }

    pub fn build_delete<R: Resource>(&self, parent_code: &str, code: &str) -> HttpRequest {
        request(HttpMethod::Delete, self.member_path::<R>(parent_code, code), Vec::new(), None)
    }

    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        check_status(&response, 200)?;
        let records = decode_list::<R>(&parse_document(&response.body)?)?;
        debug!(resource = R::SEGMENT, count = records.len(), "parsed list");
        Ok(records)
    }

    pub fn parse_get<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response, 200)?;
        Ok(decode_record(&parse_document(&response.body)?)?)
    }

    pub fn parse_create<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response, 201)?;
        Ok(decode_record(&parse_document(&response.body)?)?)
    }

    pub fn parse_update<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        check_status(&response, 200)?;
        Ok(decode_record(&parse_document(&response.body)?)?)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }
}

fn request(
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    body: Option<String>,
) -> HttpRequest {
    let mut headers = vec![("accept".to_string(), XML_ACCEPT.to_string())];
    if body.is_some() {
        headers.push(("content-type".to_string(), XML_CONTENT_TYPE.to_string()));
    }
    debug!(method = method.as_str(), path = %path, "built request");
    HttpRequest {
        method,
        path,
        query,
        headers,
        body,
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound {
            description: error_description(&response.body),
        }),
        422 => match validation_errors(&response.body) {
            Some(errors) => Err(ApiError::Validation(errors)),
            None => Err(http_error(response)),
        },
        _ => Err(http_error(response)),
    }
}

fn http_error(response: &HttpResponse) -> ApiError {
    warn!(status = response.status, "unexpected response status");
    ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    }
}

/// `<description>` of an `<error>` payload, if the body carries one.
fn error_description(body: &str) -> Option<String> {
    let root = parse_document(body).ok()?;
    if root.name != "error" {
        return None;
    }
    root.child("description").map(|d| d.text().trim().to_string())
}

/// Structured validation errors from either payload shape:
/// `<errors><error field=".." symbol="..">msg</error></errors>` or a single
/// `<error><symbol/><description/></error>`.
fn validation_errors(body: &str) -> Option<ValidationErrors> {
    let root = parse_document(body).ok()?;
    let errors = match root.name.as_str() {
        "errors" => root
            .children()
            .iter()
            .filter(|c| c.name == "error")
            .map(entry_error)
            .collect(),
        "error" => vec![ValidationError {
            field: root.child("field").map(|f| f.text().trim().to_string()),
            symbol: root.child("symbol").map(|s| s.text().trim().to_string()),
            message: root
                .child("description")
                .map(|d| d.text().trim().to_string())
                .unwrap_or_default(),
        }],
        _ => return None,
    };
    Some(ValidationErrors { errors })
}

fn entry_error(el: &Element) -> ValidationError {
    ValidationError {
        field: el.attribute("field").map(str::to_string),
        symbol: el.attribute("symbol").map(str::to_string),
        message: el.text().trim().to_string(),
    }
}
