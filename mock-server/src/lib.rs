//! In-memory billing API speaking the add-on XML dialect.
//!
//! Add-ons are stored as raw `Element`s per plan so that update requests can
//! be merged child by child: an element present in the request replaces the
//! stored one (a `nil` element stores the null marker), and anything the
//! request leaves out is kept.

pub mod config;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use billing_core::{parse_document, AddOn, Element, Resource};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Elements a PUT cannot change.
const IMMUTABLE_FIELDS: [&str; 2] = ["add_on_code", "created_at"];

/// Add-ons per plan code, in creation order.
pub type Db = Arc<RwLock<HashMap<String, Vec<Element>>>>;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub per_page: Option<usize>,
}

/// Failures rendered as the API's XML error payloads.
#[derive(Debug, Error)]
pub enum MockError {
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Validation {
        field: String,
        symbol: String,
        message: String,
    },
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            MockError::NotFound(description) => (
                StatusCode::NOT_FOUND,
                error_payload("not_found", description),
            ),
            MockError::BadRequest(description) => (
                StatusCode::BAD_REQUEST,
                error_payload("invalid_xml", description),
            ),
            MockError::Validation {
                field,
                symbol,
                message,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Element::new("errors").with_child(
                    Element::new("error")
                        .with_attribute("field", format!("add_on.{field}"))
                        .with_attribute("symbol", symbol.as_str())
                        .with_text(message.as_str()),
                ),
            ),
        };
        debug!(status = status.as_u16(), error = %self, "request rejected");
        xml_response(status, &body)
    }
}

fn error_payload(symbol: &str, description: &str) -> Element {
    Element::new("error")
        .with_child(Element::new("symbol").with_text(symbol))
        .with_child(Element::new("description").with_text(description))
}

fn xml_response(status: StatusCode, element: &Element) -> Response {
    match element.to_document() {
        Ok(body) => (status, [(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

pub fn app() -> Router {
    app_with_plans(std::iter::empty::<String>())
}

/// Router whose store starts with the given (empty) plans.
pub fn app_with_plans<I, S>(plans: I) -> Router
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let db: Db = Arc::new(RwLock::new(
        plans.into_iter().map(|p| (p.into(), Vec::new())).collect(),
    ));
    Router::new()
        .route(
            "/plans/{plan_code}/add_ons",
            get(list_add_ons).post(create_add_on),
        )
        .route(
            "/plans/{plan_code}/add_ons/{add_on_code}",
            get(get_add_on).put(update_add_on).delete(delete_add_on),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener, plans: Vec<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_plans(plans)).await
}

fn plan_not_found(plan_code: &str) -> MockError {
    MockError::NotFound(format!("Couldn't find Plan with plan_code = {plan_code}"))
}

fn add_on_not_found(add_on_code: &str) -> MockError {
    MockError::NotFound(format!("Couldn't find AddOn with add_on_code = {add_on_code}"))
}

fn code_of(add_on: &Element) -> &str {
    add_on
        .child("add_on_code")
        .map(|c| c.text().trim())
        .unwrap_or_default()
}

/// Parse a request body and check it decodes as an add-on.
fn parse_add_on(body: &str) -> Result<Element, MockError> {
    let element = parse_document(body).map_err(|e| MockError::BadRequest(e.to_string()))?;
    if element.name != AddOn::ELEMENT {
        return Err(MockError::BadRequest(format!(
            "expected <{}> root, found <{}>",
            AddOn::ELEMENT,
            element.name
        )));
    }
    AddOn::from_element(&element).map_err(|e| MockError::Validation {
        field: e.field.clone(),
        symbol: "invalid".to_string(),
        message: e.kind.to_string(),
    })?;
    Ok(element)
}

fn set_default(add_on: &mut Element, field: &str, value: &str, kind: &str) {
    if add_on.child(field).is_none() {
        add_on.push_child(
            Element::new(field)
                .with_attribute("type", kind)
                .with_text(value),
        );
    }
}

fn merge(stored: &mut Element, patch: Element) {
    for child in patch.children {
        if IMMUTABLE_FIELDS.contains(&child.name.as_str()) {
            continue;
        }
        match stored.children.iter_mut().find(|c| c.name == child.name) {
            Some(slot) => *slot = child,
            None => stored.children.push(child),
        }
    }
}

async fn list_add_ons(
    State(db): State<Db>,
    Path(plan_code): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Response, MockError> {
    let plans = db.read().await;
    let add_ons = plans.get(&plan_code).ok_or_else(|| plan_not_found(&plan_code))?;
    let limit = query.per_page.unwrap_or(add_ons.len());
    let mut list = Element::new(AddOn::LIST_ELEMENT).with_attribute("type", "array");
    for add_on in add_ons.iter().take(limit) {
        list.push_child(add_on.clone());
    }
    Ok(xml_response(StatusCode::OK, &list))
}

async fn create_add_on(
    State(db): State<Db>,
    Path(plan_code): Path<String>,
    body: String,
) -> Result<Response, MockError> {
    let mut add_on = parse_add_on(&body)?;
    let code = code_of(&add_on).to_string();
    if code.is_empty() {
        return Err(MockError::Validation {
            field: "add_on_code".into(),
            symbol: "blank".into(),
            message: "can't be blank".into(),
        });
    }

    let mut plans = db.write().await;
    let add_ons = plans.get_mut(&plan_code).ok_or_else(|| plan_not_found(&plan_code))?;
    if add_ons.iter().any(|a| code_of(a) == code) {
        return Err(MockError::Validation {
            field: "add_on_code".into(),
            symbol: "taken".into(),
            message: "has already been taken".into(),
        });
    }

    add_on.children.retain(|c| c.name != "created_at");
    set_default(&mut add_on, "default_quantity", "1", "integer");
    set_default(&mut add_on, "display_quantity_on_hosted_page", "false", "boolean");
    set_default(
        &mut add_on,
        "created_at",
        &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "datetime",
    );
    add_ons.push(add_on.clone());
    info!(plan = %plan_code, add_on = %code, "created add-on");
    Ok(xml_response(StatusCode::CREATED, &add_on))
}

async fn get_add_on(
    State(db): State<Db>,
    Path((plan_code, add_on_code)): Path<(String, String)>,
) -> Result<Response, MockError> {
    let plans = db.read().await;
    let add_ons = plans.get(&plan_code).ok_or_else(|| plan_not_found(&plan_code))?;
    let add_on = add_ons
        .iter()
        .find(|a| code_of(a) == add_on_code)
        .ok_or_else(|| add_on_not_found(&add_on_code))?;
    Ok(xml_response(StatusCode::OK, add_on))
}

async fn update_add_on(
    State(db): State<Db>,
    Path((plan_code, add_on_code)): Path<(String, String)>,
    body: String,
) -> Result<Response, MockError> {
    let patch = parse_add_on(&body)?;
    let mut plans = db.write().await;
    let add_ons = plans.get_mut(&plan_code).ok_or_else(|| plan_not_found(&plan_code))?;
    let add_on = add_ons
        .iter_mut()
        .find(|a| code_of(a) == add_on_code)
        .ok_or_else(|| add_on_not_found(&add_on_code))?;
    merge(add_on, patch);
    info!(plan = %plan_code, add_on = %add_on_code, "updated add-on");
    Ok(xml_response(StatusCode::OK, add_on))
}

async fn delete_add_on(
    State(db): State<Db>,
    Path((plan_code, add_on_code)): Path<(String, String)>,
) -> Result<StatusCode, MockError> {
    let mut plans = db.write().await;
    let add_ons = plans.get_mut(&plan_code).ok_or_else(|| plan_not_found(&plan_code))?;
    let index = add_ons
        .iter()
        .position(|a| code_of(a) == add_on_code)
        .ok_or_else(|| add_on_not_found(&add_on_code))?;
    add_ons.remove(index);
    info!(plan = %plan_code, add_on = %add_on_code, "deleted add-on");
    Ok(StatusCode::NO_CONTENT)
}
