// Copyright (c) 2025 - Cowboy AI, Inc.

//! NetBox REST Client
//!
//! [`CmdbClient`] over the NetBox REST API. Responses are flattened into the
//! engine's attribute schema; requests are built back from it, with related
//! objects referenced by id (`device_id`, `lag_id`, ...) or by nested
//! attributes (sites, roles and tenants by slug; platforms by name).
//!
//! ```text
//! Device        /api/dcim/devices/
//! Interface     /api/dcim/interfaces/
//! IpAddress     /api/ipam/ip-addresses/
//! Vlan          /api/ipam/vlans/
//! Cable         /api/dcim/cables/
//! InventoryItem /api/dcim/inventory-items/
//! ```
//!
//! Lists follow `next` until the last page. Bulk calls send a JSON list to
//! the same endpoint.
//!
//! # Status mapping
//!
//! | Status | Error |
//! |---|---|
//! | 401 | [`CmdbError::Auth`] |
//! | 403 | [`CmdbError::Permission`] |
//! | 429, 5xx, timeout, connection failure | [`CmdbError::Transient`] |
//! | other 4xx | [`CmdbError::Rejected`] |

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use super::{CmdbClient, LookupKey, ObjectId, RemoteObject, Scope};
use crate::config::NetBoxConfig;
use crate::errors::{CmdbError, CmdbResult};
use crate::model::{Attributes, EntityKind};

/// One page of a NetBox list response
#[derive(Debug, Deserialize)]
struct Page {
    next: Option<String>,
    results: Vec<Value>,
}

/// NetBox client implementing [`CmdbClient`]
pub struct NetBoxClient {
    config: NetBoxConfig,
    client: Client,
}

fn endpoint(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Device => "dcim/devices",
        EntityKind::Interface => "dcim/interfaces",
        EntityKind::IpAddress => "ipam/ip-addresses",
        EntityKind::Vlan => "ipam/vlans",
        EntityKind::Cable => "dcim/cables",
        EntityKind::InventoryItem => "dcim/inventory-items",
    }
}

impl NetBoxClient {
    /// Build a client with the token and timeout from `config`
    pub fn new(config: NetBoxConfig) -> CmdbResult<Self> {
        info!("Connecting to NetBox at {}", config.base_url);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Token {}", config.api_token)
                .parse()
                .map_err(|e| CmdbError::Auth(format!("Invalid API token: {}", e)))?,
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| CmdbError::Transient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Check that the API is reachable and the token is accepted
    pub async fn health_check(&self) -> CmdbResult<()> {
        let url = format!("{}/api/status/", self.config.base_url);
        check(self.client.get(&url).send().await?).await?;
        debug!("NetBox health check passed");
        Ok(())
    }

    fn url(&self, kind: EntityKind) -> String {
        format!("{}/api/{}/", self.config.base_url, endpoint(kind))
    }

    fn object_url(&self, kind: EntityKind, id: ObjectId) -> String {
        format!("{}{}/", self.url(kind), id.0)
    }

    async fn send(&self, method: Method, url: &str, body: Option<Value>) -> CmdbResult<Response> {
        debug!("NetBox {} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        check(request.send().await?).await
    }

    /// Every object matching `query`, across all pages
    async fn fetch_all(
        &self,
        kind: EntityKind,
        query: &[(&str, String)],
    ) -> CmdbResult<Vec<RemoteObject>> {
        let mut url = Some(format!(
            "{}?{}",
            self.url(kind),
            encode_query(query, self.config.page_size)
        ));
        let mut objects = Vec::new();

        while let Some(next) = url.take() {
            let page: Page = self.send(Method::GET, &next, None).await?.json().await?;
            for raw in &page.results {
                objects.push(flatten(kind, raw)?);
            }
            url = page.next;
        }

        Ok(objects)
    }
}

fn encode_query(query: &[(&str, String)], page_size: usize) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .chain(std::iter::once(format!("limit={}", page_size)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Map a response status to the error taxonomy
async fn check(response: Response) -> CmdbResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, body))
}

fn status_error(status: StatusCode, body: String) -> CmdbError {
    match status {
        StatusCode::UNAUTHORIZED => CmdbError::Auth(body),
        StatusCode::FORBIDDEN => CmdbError::Permission(body),
        StatusCode::TOO_MANY_REQUESTS => CmdbError::Transient(format!("rate limited: {}", body)),
        s if s.is_server_error() => CmdbError::Transient(format!("{}: {}", s, body)),
        s => CmdbError::Rejected {
            status: s.as_u16(),
            message: body,
        },
    }
}

fn lookup_query(key: &LookupKey) -> Vec<(&'static str, String)> {
    match key {
        LookupKey::Device { name } => vec![("name", name.clone())],
        LookupKey::Interface { device_id, name } | LookupKey::InventoryItem { device_id, name } => {
            vec![("device_id", device_id.0.to_string()), ("name", name.clone())]
        }
        LookupKey::IpAddress { address } => vec![("address", address.clone())],
        LookupKey::Vlan { vid, site } => vec![
            ("vid", vid.to_string()),
            match site {
                Some(site) => ("site", site.clone()),
                None => ("site_id", "null".to_string()),
            },
        ],
    }
}

fn scope_query(scope: &Scope) -> Vec<(&'static str, String)> {
    match scope {
        Scope::All => Vec::new(),
        Scope::Device(id) => vec![("device_id", id.0.to_string())],
        Scope::Site(site) => vec![("site", site.clone())],
        Scope::Tenant(tenant) => vec![("tenant", tenant.clone())],
    }
}

/// `raw[field][nested]` as a flat value
fn nested(raw: &Value, field: &str, nested: &str) -> Value {
    raw.get(field)
        .and_then(|v| v.get(nested))
        .cloned()
        .unwrap_or(Value::Null)
}

fn plain(raw: &Value, field: &str) -> Value {
    raw.get(field).cloned().unwrap_or(Value::Null)
}

/// Choice fields come back as `{value, label}`
fn choice(raw: &Value, field: &str) -> Value {
    match raw.get(field) {
        Some(Value::Object(obj)) => obj.get("value").cloned().unwrap_or(Value::Null),
        Some(other) => other.clone(),
        None => Value::Null,
    }
}

/// Flatten one NetBox object into the attribute schema
fn flatten(kind: EntityKind, raw: &Value) -> CmdbResult<RemoteObject> {
    let id = raw
        .get("id")
        .and_then(Value::as_u64)
        .ok_or_else(|| CmdbError::Decode(format!("{} object without id", kind)))?;

    let pairs: Vec<(&str, Value)> = match kind {
        EntityKind::Device => vec![
            ("name", plain(raw, "name")),
            ("site", nested(raw, "site", "slug")),
            ("role", nested(raw, "role", "slug")),
            ("tenant", nested(raw, "tenant", "slug")),
            ("serial", plain(raw, "serial")),
            ("model", nested(raw, "device_type", "model")),
            ("platform", nested(raw, "platform", "name")),
        ],
        EntityKind::Interface => vec![
            ("name", plain(raw, "name")),
            ("device", nested(raw, "device", "name")),
            ("device_id", nested(raw, "device", "id")),
            ("type", choice(raw, "type")),
            ("mode", choice(raw, "mode")),
            ("description", plain(raw, "description")),
            ("enabled", plain(raw, "enabled")),
            ("mtu", plain(raw, "mtu")),
            ("speed", plain(raw, "speed")),
            ("lag", nested(raw, "lag", "name")),
            ("lag_id", nested(raw, "lag", "id")),
        ],
        EntityKind::IpAddress => {
            let assigned = raw.get("assigned_object").cloned().unwrap_or(Value::Null);
            vec![
                ("address", plain(raw, "address")),
                ("tenant", nested(raw, "tenant", "slug")),
                ("description", plain(raw, "description")),
                ("interface", plain(&assigned, "name")),
                ("interface_id", plain(raw, "assigned_object_id")),
                ("device", nested(&assigned, "device", "name")),
                ("device_id", nested(&assigned, "device", "id")),
            ]
        }
        EntityKind::Vlan => vec![
            ("vid", plain(raw, "vid")),
            ("name", plain(raw, "name")),
            ("site", nested(raw, "site", "slug")),
        ],
        EntityKind::Cable => {
            let end = |side: &str| {
                raw.get(side)
                    .and_then(|t| t.get(0))
                    .and_then(|t| t.get("object"))
                    .cloned()
                    .unwrap_or(Value::Null)
            };
            let a = end("a_terminations");
            let b = end("b_terminations");
            vec![
                ("a_device", nested(&a, "device", "name")),
                ("a_device_id", nested(&a, "device", "id")),
                ("a_interface", plain(&a, "name")),
                ("a_interface_id", plain(&a, "id")),
                ("b_device", nested(&b, "device", "name")),
                ("b_device_id", nested(&b, "device", "id")),
                ("b_interface", plain(&b, "name")),
                ("b_interface_id", plain(&b, "id")),
            ]
        }
        EntityKind::InventoryItem => vec![
            ("name", plain(raw, "name")),
            ("device", nested(raw, "device", "name")),
            ("device_id", nested(raw, "device", "id")),
            ("serial", plain(raw, "serial")),
            ("part_id", plain(raw, "part_id")),
            ("vendor", nested(raw, "manufacturer", "name")),
            ("description", plain(raw, "description")),
        ],
    };

    let attrs = pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    Ok(RemoteObject::new(ObjectId(id), attrs))
}

/// `{key: value}` for a related object, or null
fn related(key: &str, value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        other => {
            let mut object = Attributes::new();
            object.insert(key.to_string(), other.clone());
            Value::Object(object)
        }
    }
}

fn termination(interface_id: &Value) -> Value {
    json!([{ "object_type": "dcim.interface", "object_id": interface_id }])
}

/// Request body for the given (possibly partial) attributes
fn build(kind: EntityKind, attrs: &Attributes) -> Attributes {
    let mut body = Attributes::new();
    for (field, value) in attrs {
        let mapped: Option<(&str, Value)> = match (kind, field.as_str()) {
            (EntityKind::Device, "site") => Some(("site", related("slug", value))),
            (EntityKind::Device, "role") => Some(("role", related("slug", value))),
            (EntityKind::Device, "model") => Some(("device_type", related("model", value))),
            (EntityKind::Device, "platform") => Some(("platform", related("name", value))),
            (EntityKind::Device | EntityKind::IpAddress, "tenant") => {
                Some(("tenant", related("slug", value)))
            }

            (EntityKind::Interface | EntityKind::InventoryItem, "device_id") => {
                Some(("device", value.clone()))
            }
            (EntityKind::Interface | EntityKind::InventoryItem, "device") => None,
            (EntityKind::Interface, "lag_id") => Some(("lag", value.clone())),
            // A cleared aggregate has no id to send
            (EntityKind::Interface, "lag") if value.is_null() => Some(("lag", Value::Null)),
            (EntityKind::Interface, "lag") => None,

            (EntityKind::IpAddress, "interface_id") => {
                body.insert("assigned_object_type".into(), json!("dcim.interface"));
                Some(("assigned_object_id", value.clone()))
            }
            (EntityKind::IpAddress, "interface") if value.is_null() => {
                body.insert("assigned_object_type".into(), Value::Null);
                Some(("assigned_object_id", Value::Null))
            }
            (EntityKind::IpAddress, "interface" | "device" | "device_id") => None,

            (EntityKind::Vlan, "site") => Some(("site", related("slug", value))),

            (EntityKind::Cable, "a_interface_id") => Some(("a_terminations", termination(value))),
            (EntityKind::Cable, "b_interface_id") => Some(("b_terminations", termination(value))),
            (EntityKind::Cable, _) => None,

            (EntityKind::InventoryItem, "vendor") => {
                Some(("manufacturer", related("name", value)))
            }

            (_, other) => Some((other, value.clone())),
        };

        if let Some((key, value)) = mapped {
            body.insert(key.to_string(), value);
        }
    }
    body
}

fn object_id(raw: &Value) -> CmdbResult<ObjectId> {
    raw.get("id")
        .and_then(Value::as_u64)
        .map(ObjectId)
        .ok_or_else(|| CmdbError::Decode("response without id".to_string()))
}

#[async_trait]
impl CmdbClient for NetBoxClient {
    async fn find_by_key(&self, key: &LookupKey) -> CmdbResult<Option<RemoteObject>> {
        let mut found = self.fetch_all(key.kind(), &lookup_query(key)).await?;
        if found.len() > 1 {
            debug!("{} matched {} objects, using the first", key, found.len());
        }
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    async fn list(&self, kind: EntityKind, scope: &Scope) -> CmdbResult<Vec<RemoteObject>> {
        self.fetch_all(kind, &scope_query(scope)).await
    }

    async fn create(&self, kind: EntityKind, attrs: Attributes) -> CmdbResult<ObjectId> {
        let body = Value::Object(build(kind, &attrs));
        let created: Value = self
            .send(Method::POST, &self.url(kind), Some(body))
            .await?
            .json()
            .await?;
        object_id(&created)
    }

    async fn update(&self, kind: EntityKind, id: ObjectId, attrs: Attributes) -> CmdbResult<()> {
        let body = Value::Object(build(kind, &attrs));
        self.send(Method::PATCH, &self.object_url(kind, id), Some(body))
            .await?;
        Ok(())
    }

    async fn delete(&self, kind: EntityKind, id: ObjectId) -> CmdbResult<()> {
        self.send(Method::DELETE, &self.object_url(kind, id), None)
            .await?;
        Ok(())
    }

    async fn bulk_create(
        &self,
        kind: EntityKind,
        items: Vec<Attributes>,
    ) -> CmdbResult<Vec<ObjectId>> {
        let body: Vec<Value> = items
            .iter()
            .map(|attrs| Value::Object(build(kind, attrs)))
            .collect();
        let created: Vec<Value> = self
            .send(Method::POST, &self.url(kind), Some(Value::Array(body)))
            .await?
            .json()
            .await?;
        created.iter().map(object_id).collect()
    }

    async fn bulk_update(
        &self,
        kind: EntityKind,
        items: Vec<(ObjectId, Attributes)>,
    ) -> CmdbResult<()> {
        let body: Vec<Value> = items
            .iter()
            .map(|(id, attrs)| {
                let mut object = build(kind, attrs);
                object.insert("id".into(), Value::from(id.0));
                Value::Object(object)
            })
            .collect();
        self.send(Method::PATCH, &self.url(kind), Some(Value::Array(body)))
            .await?;
        Ok(())
    }

    async fn bulk_delete(&self, kind: EntityKind, ids: Vec<ObjectId>) -> CmdbResult<()> {
        let body: Vec<Value> = ids.iter().map(|id| json!({ "id": id.0 })).collect();
        self.send(Method::DELETE, &self.url(kind), Some(Value::Array(body)))
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "netbox"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interface, Record};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, String::new()),
            CmdbError::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, String::new()),
            CmdbError::Permission(_)
        ));
        assert!(status_error(StatusCode::TOO_MANY_REQUESTS, String::new()).is_transient());
        assert!(status_error(StatusCode::BAD_GATEWAY, String::new()).is_transient());
        assert_eq!(
            status_error(StatusCode::BAD_REQUEST, "name: required".into()),
            CmdbError::Rejected {
                status: 400,
                message: "name: required".into()
            }
        );
    }

    #[test]
    fn test_flatten_interface() {
        let raw = json!({
            "id": 41,
            "name": "Te1/0/1",
            "device": {"id": 7, "name": "sw1"},
            "type": {"value": "10gbase-x-sfpp", "label": "SFP+ (10GE)"},
            "mode": {"value": "tagged", "label": "Tagged"},
            "description": "",
            "enabled": true,
            "mtu": null,
            "speed": 10000000,
            "lag": {"id": 40, "name": "Po1"}
        });

        let object = flatten(EntityKind::Interface, &raw).unwrap();
        assert_eq!(object.id, ObjectId(41));
        assert_eq!(object.attrs["device_id"], 7);
        assert_eq!(object.attrs["lag_id"], 40);

        let iface = Interface::from_attributes(&object.attrs).unwrap();
        assert_eq!(iface.device, "sw1");
        assert_eq!(iface.lag.as_deref(), Some("Po1"));
        assert_eq!(iface.speed, Some(10_000_000));
    }

    #[test]
    fn test_flatten_cable_terminations() {
        let raw = json!({
            "id": 3,
            "a_terminations": [{"object_type": "dcim.interface", "object_id": 11,
                "object": {"id": 11, "name": "Gi0/1", "device": {"id": 1, "name": "sw1"}}}],
            "b_terminations": [{"object_type": "dcim.interface", "object_id": 22,
                "object": {"id": 22, "name": "Gi0/48", "device": {"id": 2, "name": "sw2"}}}]
        });

        let object = flatten(EntityKind::Cable, &raw).unwrap();
        assert_eq!(object.attrs["a_interface"], "Gi0/1");
        assert_eq!(object.attrs["b_device_id"], 2);
    }

    #[test]
    fn test_build_interface_uses_ids() {
        let attrs = json!({
            "device": "sw1",
            "device_id": 7,
            "name": "Te1/0/1",
            "lag": "Po1",
            "lag_id": 40,
        })
        .as_object()
        .cloned()
        .unwrap();

        let body = build(EntityKind::Interface, &attrs);
        assert_eq!(body["device"], 7);
        assert_eq!(body["lag"], 40);
        assert_eq!(body.len(), 3);
    }

    #[test]
    fn test_build_ip_rebind() {
        let attrs = json!({"interface": "Lo0", "interface_id": 9, "device": "r1", "device_id": 1})
            .as_object()
            .cloned()
            .unwrap();

        let body = build(EntityKind::IpAddress, &attrs);
        assert_eq!(body["assigned_object_type"], "dcim.interface");
        assert_eq!(body["assigned_object_id"], 9);
        assert!(!body.contains_key("device"));
    }

    #[test]
    fn test_query_encoding() {
        let query = encode_query(&[("name", "Gi0/1 uplink".to_string())], 250);
        assert_eq!(query, "name=Gi0%2F1%20uplink&limit=250");
    }

    #[test]
    fn test_missing_id_is_decode_error() {
        assert!(matches!(
            flatten(EntityKind::Device, &json!({"name": "sw1"})),
            Err(CmdbError::Decode(_))
        ));
    }
}
