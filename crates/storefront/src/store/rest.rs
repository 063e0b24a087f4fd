//! Hosted catalog client.
//!
//! Speaks the PostgREST dialect used by the hosted database service: every
//! descriptor becomes query-string filters on `/rest/v1/<table>`, the exact
//! match count comes back in `Content-Range`, and writes are `PATCH`es
//! filtered by id.
//!
//! Bulk reads and single-product reads are cached with `moka`; any write
//! clears the cache.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::header::{CONTENT_RANGE, HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use handicraft_core::{ProductId, ProductRecord};

use super::{CatalogStore, escape_like};
use crate::admin::{BulkUpdate, ProductUpdate};
use crate::config::CatalogConfig;
use crate::error::StoreError;
use crate::query::{Predicate, ProductQuery, QueryPage, Value};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    All,
    Product(ProductId),
}

#[derive(Debug, Clone)]
enum CacheValue {
    All(Arc<Vec<ProductRecord>>),
    Product(Box<ProductRecord>),
}

/// Client for a PostgREST-compatible products table.
#[derive(Clone)]
pub struct RestCatalogStore {
    inner: Arc<RestCatalogStoreInner>,
}

struct RestCatalogStoreInner {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for RestCatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestCatalogStore")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl RestCatalogStore {
    /// Create a client for the configured service and table.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidConfig` if the store URL cannot be parsed
    /// or cannot carry a path.
    pub fn new(config: &CatalogConfig) -> Result<Self, StoreError> {
        let base = Url::parse(config.store_url.expose_secret())
            .map_err(|e| StoreError::InvalidConfig(format!("store URL: {e}")))?;
        let endpoint = base
            .join(&format!("rest/v1/{}", config.table))
            .map_err(|e| StoreError::InvalidConfig(format!("store URL: {e}")))?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(RestCatalogStoreInner {
                client: reqwest::Client::new(),
                endpoint,
                api_key: config.api_key_str().to_string(),
                cache,
            }),
        })
    }

    /// The table endpoint requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    fn request(&self, method: Method, params: &[(String, String)]) -> RequestBuilder {
        let mut url = self.inner.endpoint.clone();
        url.set_query(Some(&encode_query(params)));

        self.inner
            .client
            .request(method, url)
            .header("apikey", &self.inner.api_key)
            .bearer_auth(&self.inner.api_key)
    }

    /// Send a request, returning the status, headers, and body text.
    ///
    /// Rate limiting is mapped to `StoreError::RateLimited`; every other
    /// status is left to the caller.
    async fn send(&self, request: RequestBuilder) -> Result<(StatusCode, HeaderMap, String), StoreError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(StoreError::RateLimited(retry_after));
        }

        let headers = response.headers().clone();
        let body = response.text().await?;
        Ok((status, headers, body))
    }

    /// Send a request and decode a JSON array of rows.
    async fn send_rows<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<(Vec<T>, HeaderMap), StoreError> {
        let (status, headers, body) = self.send(request).await?;
        Ok((decode_rows(status, &body)?, headers))
    }

    async fn patch<B: Serialize + Sync>(
        &self,
        params: &[(String, String)],
        body: &B,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        let request = self
            .request(Method::PATCH, params)
            .header("Prefer", "return=representation")
            .json(body);
        let (rows, _) = self.send_rows(request).await?;
        self.inner.cache.invalidate_all();
        Ok(rows)
    }
}

impl CatalogStore for RestCatalogStore {
    #[instrument(skip(self, query), fields(predicates = query.predicates.len(), offset = query.offset))]
    async fn query(&self, query: &ProductQuery) -> Result<QueryPage, StoreError> {
        let request = self
            .request(Method::GET, &render_params(query))
            .header("Prefer", "count=exact");
        let (status, headers, body) = self.send(request).await?;
        if let Some(page) = page_past_end(status, &headers) {
            debug!(total = page.total_count, "Offset past the last match");
            return Ok(page);
        }
        let items: Vec<ProductRecord> = decode_rows(status, &body)?;

        let total_count = headers
            .get(CONTENT_RANGE)
            .and_then(parse_content_range_total)
            .unwrap_or(items.len() as u64);

        Ok(QueryPage { items, total_count })
    }

    #[instrument(skip(self))]
    async fn fetch_all(&self) -> Result<Vec<ProductRecord>, StoreError> {
        if let Some(CacheValue::All(records)) = self.inner.cache.get(&CacheKey::All).await {
            debug!("Cache hit for full catalog");
            return Ok(records.as_ref().clone());
        }

        let params = vec![
            ("select".to_string(), "*".to_string()),
            ("order".to_string(), "id.asc".to_string()),
        ];
        let (records, _): (Vec<ProductRecord>, _) =
            self.send_rows(self.request(Method::GET, &params)).await?;

        self.inner
            .cache
            .insert(CacheKey::All, CacheValue::All(Arc::new(records.clone())))
            .await;
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn fetch_by_id(&self, id: ProductId) -> Result<Option<ProductRecord>, StoreError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(record)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*record));
        }

        let params = vec![
            ("select".to_string(), "*".to_string()),
            ("id".to_string(), format!("eq.{id}")),
            ("limit".to_string(), "1".to_string()),
        ];
        let (records, _): (Vec<ProductRecord>, _) =
            self.send_rows(self.request(Method::GET, &params)).await?;

        let record = records.into_iter().next();
        if let Some(record) = &record {
            self.inner
                .cache
                .insert(key, CacheValue::Product(Box::new(record.clone())))
                .await;
        }
        Ok(record)
    }

    #[instrument(skip(self, update))]
    async fn update_product(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<ProductRecord, StoreError> {
        let params = vec![("id".to_string(), format!("eq.{id}"))];
        self.patch(&params, update)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    #[instrument(skip(self, ids, update), fields(ids = ids.len()))]
    async fn bulk_update(&self, ids: &[ProductId], update: &BulkUpdate) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let params = vec![("id".to_string(), format!("in.({id_list})"))];
        let rows = self.patch(&params, update).await?;
        Ok(rows.len() as u64)
    }
}

// =============================================================================
// Responses
// =============================================================================

fn decode_rows<T: serde::de::DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<Vec<T>, StoreError> {
    if !status.is_success() {
        tracing::error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Catalog service returned non-success status"
        );
        return Err(StoreError::Service {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse catalog response"
        );
        StoreError::Parse(e)
    })
}

/// An empty page for an offset beyond the matched set.
///
/// With an exact count requested, the service answers such an offset with
/// `416 Range Not Satisfiable` and a `Content-Range` of `*/<total>`.
fn page_past_end(status: StatusCode, headers: &HeaderMap) -> Option<QueryPage> {
    (status == StatusCode::RANGE_NOT_SATISFIABLE).then(|| QueryPage {
        items: Vec::new(),
        total_count: headers
            .get(CONTENT_RANGE)
            .and_then(parse_content_range_total)
            .unwrap_or(0),
    })
}

// =============================================================================
// Query rendering
// =============================================================================

/// Render a descriptor as PostgREST query parameters.
///
/// Top-level predicates are AND-ed by the service; each `AnyOf` becomes its
/// own `or=(...)` parameter.
#[must_use]
pub fn render_params(query: &ProductQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    params.extend(query.predicates.iter().map(render_top_level));

    if !query.orderings.is_empty() {
        let order = query
            .orderings
            .iter()
            .map(|o| format!("{}.{}", o.column.as_str(), o.direction.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        params.push(("order".to_string(), order));
    }

    params.push(("offset".to_string(), query.offset.to_string()));
    params.push(("limit".to_string(), query.limit.to_string()));
    params
}

fn render_top_level(predicate: &Predicate) -> (String, String) {
    match predicate {
        Predicate::Eq { column, value } => (column.as_str().to_string(), format!("eq.{}", value.to_literal())),
        Predicate::Gte { column, value } => (column.as_str().to_string(), format!("gte.{}", value.to_literal())),
        Predicate::Lte { column, value } => (column.as_str().to_string(), format!("lte.{}", value.to_literal())),
        Predicate::In { column, values } => (column.as_str().to_string(), format!("in.({})", quoted_list(values))),
        Predicate::ILike { column, pattern } => {
            (column.as_str().to_string(), format!("ilike.*{}*", escape_like(pattern)))
        }
        Predicate::Contains { column, value } => (column.as_str().to_string(), format!("cs.{{{}}}", quote(value))),
        Predicate::NotFalse { column } => (column.as_str().to_string(), "not.is.false".to_string()),
        // id is never null, so an empty alternative matches nothing
        Predicate::AnyOf { predicates } if predicates.is_empty() => ("id".to_string(), "is.null".to_string()),
        Predicate::AnyOf { predicates } => ("or".to_string(), format!("({})", render_group(predicates))),
    }
}

fn render_group(predicates: &[Predicate]) -> String {
    predicates
        .iter()
        .map(render_nested)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render inside a logic tree, where values containing reserved
/// characters must be double-quoted.
fn render_nested(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Eq { column, value } => format!("{}.eq.{}", column.as_str(), nested_value(value)),
        Predicate::Gte { column, value } => format!("{}.gte.{}", column.as_str(), nested_value(value)),
        Predicate::Lte { column, value } => format!("{}.lte.{}", column.as_str(), nested_value(value)),
        Predicate::In { column, values } => format!("{}.in.({})", column.as_str(), quoted_list(values)),
        Predicate::ILike { column, pattern } => {
            let pattern = format!("*{}*", escape_like(pattern));
            format!("{}.ilike.{}", column.as_str(), quote(&pattern))
        }
        Predicate::Contains { column, value } => {
            format!("{}.cs.{{{}}}", column.as_str(), quote(value))
        }
        Predicate::NotFalse { column } => format!("{}.not.is.false", column.as_str()),
        Predicate::AnyOf { predicates } if predicates.is_empty() => "id.is.null".to_string(),
        Predicate::AnyOf { predicates } => format!("or({})", render_group(predicates)),
    }
}

fn nested_value(value: &Value) -> String {
    match value {
        Value::Text(text) => quote(text),
        other => other.to_literal(),
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quoted_list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(",")
}

fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Total row count from a `Content-Range` header such as `0-11/15`.
fn parse_content_range_total(value: &HeaderValue) -> Option<u64> {
    let (_, total) = value.to_str().ok()?.rsplit_once('/')?;
    total.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::query::{Column, Ordering};
    use handicraft_core::PageRequest;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn test_plain_query() {
        let params = render_params(&ProductQuery::new());
        assert_eq!(param(&params, "select"), vec!["*"]);
        assert_eq!(param(&params, "order"), vec!["id.asc"]);
        assert_eq!(param(&params, "offset"), vec!["0"]);
        assert_eq!(param(&params, "limit"), vec!["12"]);
    }

    #[test]
    fn test_filters_render_as_operators() {
        let query = ProductQuery::new()
            .filter(Predicate::in_set(
                Column::Category,
                vec!["Brass Idols".to_string(), "Lamps".to_string()],
            ))
            .filter(Predicate::gte(Column::Price, Value::Decimal(Decimal::new(500, 0))))
            .filter(Predicate::lte(Column::WidthIn, Value::Number(12.5)))
            .filter(Predicate::ilike(Column::Sku, "HC-"))
            .filter(Predicate::NotFalse {
                column: Column::IsVisible,
            })
            .paginate(PageRequest::new(2, 12));

        let params = render_params(&query);
        assert_eq!(param(&params, "category"), vec![r#"in.("Brass Idols","Lamps")"#]);
        assert_eq!(param(&params, "price"), vec!["gte.500"]);
        assert_eq!(param(&params, "width_in"), vec!["lte.12.5"]);
        assert_eq!(param(&params, "sku"), vec!["ilike.*HC-*"]);
        assert_eq!(param(&params, "is_visible"), vec!["not.is.false"]);
        assert_eq!(param(&params, "offset"), vec!["12"]);
    }

    #[test]
    fn test_each_or_group_is_separate() {
        let gods = vec!["Shiva".to_string(), "Ganesha".to_string()];
        let query = ProductQuery::new()
            .filter(Predicate::any_of(vec![
                Predicate::ilike(Column::Name, "diya, brass"),
                Predicate::ilike(Column::Weight, "2kg"),
            ]))
            .filter(Predicate::contains_any(Column::RelatedGods, &gods));

        let params = render_params(&query);
        assert_eq!(
            param(&params, "or"),
            vec![
                r#"(name.ilike."*diya, brass*",weight.ilike."*2kg*")"#,
                r#"(related_gods.cs.{"Shiva"},related_gods.cs.{"Ganesha"})"#,
            ]
        );
    }

    #[test]
    fn test_ordering_keeps_tiebreak() {
        let query = ProductQuery::new().order_by(vec![Ordering::desc(Column::Price)]);
        assert_eq!(param(&render_params(&query), "order"), vec!["price.desc,id.asc"]);
    }

    #[test]
    fn test_search_text_wildcards_match_literally() {
        let query = ProductQuery::new()
            .filter(Predicate::any_of(vec![
                Predicate::ilike(Column::Name, "100%"),
                Predicate::ilike(Column::Sku, "BR_1"),
            ]))
            .filter(Predicate::ilike(Column::Sku, "BR_1"));

        let params = render_params(&query);
        assert_eq!(param(&params, "sku"), vec![r"ilike.*BR\_1*"]);
        assert_eq!(
            param(&params, "or"),
            vec![r#"(name.ilike."*100\\%*",sku.ilike."*BR\\_1*")"#]
        );
    }

    #[test]
    fn test_offset_past_end_is_empty_page() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("*/3"));

        let page = page_past_end(StatusCode::RANGE_NOT_SATISFIABLE, &headers).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);

        assert!(page_past_end(StatusCode::OK, &headers).is_none());
        assert!(page_past_end(StatusCode::BAD_REQUEST, &headers).is_none());
    }

    #[test]
    fn test_decode_rows_by_status() {
        let rows: Vec<serde_json::Value> = decode_rows(StatusCode::PARTIAL_CONTENT, "[{}]").unwrap();
        assert_eq!(rows.len(), 1);

        let err = decode_rows::<serde_json::Value>(StatusCode::RANGE_NOT_SATISFIABLE, "{}").unwrap_err();
        assert!(matches!(err, StoreError::Service { status: 416, .. }));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"6" idol"#), r#""6\" idol""#);
    }

    #[test]
    fn test_encode_query() {
        let encoded = encode_query(&[("or".to_string(), "(a.eq.\"b c\")".to_string())]);
        assert_eq!(encoded, "or=%28a.eq.%22b%20c%22%29");
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(
            parse_content_range_total(&HeaderValue::from_static("0-11/15")),
            Some(15)
        );
        assert_eq!(
            parse_content_range_total(&HeaderValue::from_static("*/0")),
            Some(0)
        );
        assert_eq!(
            parse_content_range_total(&HeaderValue::from_static("0-11/*")),
            None
        );
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = CatalogConfig::from_lookup(|key| match key {
            "CATALOG_STORE_URL" => Some("https://catalog.example.co/".to_string()),
            "CATALOG_API_KEY" => Some("sb_k3y_Xq9vT2mLp8RwZ4nYc7".to_string()),
            _ => None,
        })
        .unwrap();
        let store = RestCatalogStore::new(&config).unwrap();
        assert_eq!(
            store.endpoint().as_str(),
            "https://catalog.example.co/rest/v1/products"
        );
    }
}
