//! # Wikibase HTTP Client
//!
//! [`StoreClient`] over the MediaWiki action API of a ScienceSource wiki.
//!
//! | Operation | API call |
//! |-----------|----------|
//! | resolve label | `wbsearchentities` (exact label match) |
//! | create article | `edit` with `createonly` |
//! | create item | `wbeditentity` with `new=item` |
//! | add statements | `wbeditentity` with `id=` |
//!
//! Writes carry a CSRF token fetched once through `meta=tokens` and
//! refreshed when the wiki reports `badtoken`.

use crate::config::Config;
use sciencesource_core::{
    ItemId, PageId, PropertyId, PropertyPayload, PropertyValue, StoreClient, StoreError,
};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::time::Duration;

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the wiki.
    ConnectionFailed(String),
    /// 401/403 - invalid or missing access token.
    Unauthorized,
    /// 429 Too Many Requests.
    RateLimited,
    /// Server returned a 5xx error.
    ServerError(u16, String),
    /// The API answered with an `error` object.
    Api { code: String, info: String },
    /// No entity carries the exact label.
    NotFound(String),
    /// An item payload carries no statement naming its type.
    Unclassified(String),
    /// Failed to parse response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to wiki at {url}"),
            Self::Unauthorized => write!(f, "Unauthorized: invalid or missing access token"),
            Self::RateLimited => write!(f, "Rate limited: too many requests"),
            Self::ServerError(status, msg) => write!(f, "Server error ({status}): {msg}"),
            Self::Api { code, info } => write!(f, "API error {code}: {info}"),
            Self::NotFound(label) => write!(f, "No entity labelled {label:?}"),
            Self::Unclassified(item_type) => {
                write!(f, "Item payload does not classify the item as {item_type}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<ClientError> for StoreError {
    fn from(e: ClientError) -> Self {
        StoreError::new(e.to_string())
    }
}

// =============================================================================
// CLIENT
// =============================================================================

/// Blocking client for one wiki.
pub struct WikibaseClient {
    http: reqwest::blocking::Client,
    api_url: String,
    token: Option<String>,
    language: String,
    csrf: RefCell<Option<String>>,
}

impl WikibaseClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", config.url)))?;
        Ok(Self {
            http,
            api_url: config.api_url(),
            token: config.token.clone(),
            language: config.language.clone(),
            csrf: RefCell::new(None),
        })
    }

    /// Attach Bearer auth when a token is configured.
    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match self.token {
            Some(ref token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Send a request and handle connection errors.
    fn send(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> Result<reqwest::blocking::Response, ClientError> {
        req.send()
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.api_url)))
    }

    /// Check status codes, parse JSON and surface API errors.
    fn handle_response(&self, resp: reqwest::blocking::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if status.is_server_error() {
            let body = resp.text().unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), body));
        }
        let body = resp
            .json::<Value>()
            .map_err(|e| ClientError::ParseError(e.to_string()))?;
        match api_error(&body) {
            Some(e) => Err(e),
            None => Ok(body),
        }
    }

    fn get(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let req = self
            .http
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params);
        let resp = self.send(self.authorize(req))?;
        self.handle_response(resp)
    }

    fn post(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        let mut form: Vec<(&str, &str)> = vec![("format", "json"), ("formatversion", "2")];
        form.extend_from_slice(params);
        let req = self.http.post(&self.api_url).form(&form);
        let resp = self.send(self.authorize(req))?;
        self.handle_response(resp)
    }

    /// Cached CSRF token.
    fn csrf_token(&self) -> Result<String, ClientError> {
        if let Some(token) = self.csrf.borrow().as_ref() {
            return Ok(token.clone());
        }
        let body = self.get(&[("action", "query"), ("meta", "tokens"), ("type", "csrf")])?;
        let token = body
            .pointer("/query/tokens/csrftoken")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::ParseError("response has no csrftoken".to_string()))?
            .to_string();
        *self.csrf.borrow_mut() = Some(token.clone());
        Ok(token)
    }

    /// POST a write, retrying once with a fresh token on `badtoken`.
    fn write(&self, params: &[(&str, &str)]) -> Result<Value, ClientError> {
        match self.post_with_token(params, &self.csrf_token()?) {
            Err(ClientError::Api { ref code, .. }) if code == "badtoken" => {
                tracing::debug!("CSRF token rejected, fetching a new one");
                self.csrf.borrow_mut().take();
                self.post_with_token(params, &self.csrf_token()?)
            }
            other => other,
        }
    }

    fn post_with_token(&self, params: &[(&str, &str)], token: &str) -> Result<Value, ClientError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("token", token));
        self.post(&form)
    }

    fn search(&self, label: &str, entity_type: &str) -> Result<String, ClientError> {
        let body = self.get(&[
            ("action", "wbsearchentities"),
            ("search", label),
            ("language", self.language.as_str()),
            ("type", entity_type),
            ("limit", "50"),
        ])?;
        let id = exact_match(&body, label)?;
        tracing::debug!(label, id = %id, "label resolved");
        Ok(id)
    }
}

impl StoreClient for WikibaseClient {
    fn resolve_property_label(&self, label: &str) -> Result<PropertyId, StoreError> {
        Ok(PropertyId::new(self.search(label, "property")?))
    }

    fn resolve_item_label(&self, label: &str) -> Result<ItemId, StoreError> {
        Ok(ItemId::new(self.search(label, "item")?))
    }

    fn create_article(&self, title: &str, content: &str) -> Result<PageId, StoreError> {
        let body = self.write(&[
            ("action", "edit"),
            ("title", title),
            ("text", content),
            ("createonly", "1"),
            ("summary", "Upload annotated article"),
        ])?;
        Ok(page_id_from(&body)?)
    }

    fn create_item(
        &self,
        item_type: &ItemId,
        properties: &PropertyPayload,
    ) -> Result<ItemId, StoreError> {
        if !classifies(properties, item_type) {
            return Err(ClientError::Unclassified(item_type.to_string()).into());
        }
        let data = claims_json(properties).to_string();
        let body = self.write(&[("action", "wbeditentity"), ("new", "item"), ("data", data.as_str())])?;
        let id = entity_id_from(&body)?;
        tracing::debug!(item_type = %item_type, id = %id, "item created");
        Ok(id)
    }

    fn add_statements(
        &self,
        item: &ItemId,
        properties: &PropertyPayload,
    ) -> Result<(), StoreError> {
        let data = claims_json(properties).to_string();
        self.write(&[
            ("action", "wbeditentity"),
            ("id", item.as_str()),
            ("data", data.as_str()),
        ])?;
        Ok(())
    }
}

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Wikibase entity data holding one statement per property value.
#[must_use]
pub fn claims_json(payload: &PropertyPayload) -> Value {
    let claims: Vec<Value> = payload
        .iter()
        .map(|(property, value)| {
            json!({
                "mainsnak": {
                    "snaktype": "value",
                    "property": property.as_str(),
                    "datavalue": datavalue(value),
                },
                "type": "statement",
                "rank": "normal",
            })
        })
        .collect();
    json!({ "claims": claims })
}

/// True when some statement in `payload` points at `item_type`.
///
/// The payload carries the `instance of` statement; the client only knows
/// property ids, so any item-valued statement naming the type qualifies.
fn classifies(payload: &PropertyPayload, item_type: &ItemId) -> bool {
    payload
        .iter()
        .any(|(_, value)| matches!(value, PropertyValue::Item(id) if id == item_type))
}

fn datavalue(value: &PropertyValue) -> Value {
    match value {
        PropertyValue::Text(text) => json!({ "value": text, "type": "string" }),
        PropertyValue::Quantity(n) => json!({
            "value": { "amount": format!("{n:+}"), "unit": "1" },
            "type": "quantity",
        }),
        PropertyValue::Item(id) => {
            let mut entity = json!({ "entity-type": "item", "id": id.as_str() });
            if let Some(numeric) = id.as_str().strip_prefix('Q').and_then(|n| n.parse::<u64>().ok())
            {
                entity["numeric-id"] = json!(numeric);
            }
            json!({ "value": entity, "type": "wikibase-entityid" })
        }
    }
}

/// The `error` object of an API response, if any.
fn api_error(body: &Value) -> Option<ClientError> {
    let error = body.get("error")?;
    let field = |name: &str| {
        error
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(ClientError::Api {
        code: field("code"),
        info: field("info"),
    })
}

/// First search hit whose label equals `label` exactly.
fn exact_match(body: &Value, label: &str) -> Result<String, ClientError> {
    let hits = body
        .get("search")
        .and_then(Value::as_array)
        .ok_or_else(|| ClientError::ParseError("response has no search results".to_string()))?;
    hits.iter()
        .find(|hit| hit.get("label").and_then(Value::as_str) == Some(label))
        .and_then(|hit| hit.get("id").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| ClientError::NotFound(label.to_string()))
}

fn page_id_from(body: &Value) -> Result<PageId, ClientError> {
    let edit = body
        .get("edit")
        .ok_or_else(|| ClientError::ParseError("response has no edit result".to_string()))?;
    let result = edit.get("result").and_then(Value::as_str).unwrap_or_default();
    if result != "Success" {
        return Err(ClientError::Api {
            code: "editfailed".to_string(),
            info: format!("edit result {result:?}"),
        });
    }
    edit.get("pageid")
        .and_then(Value::as_u64)
        .map(PageId)
        .ok_or_else(|| ClientError::ParseError("edit result has no pageid".to_string()))
}

fn entity_id_from(body: &Value) -> Result<ItemId, ClientError> {
    body.pointer("/entity/id")
        .and_then(Value::as_str)
        .map(ItemId::new)
        .ok_or_else(|| ClientError::ParseError("response has no entity id".to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
