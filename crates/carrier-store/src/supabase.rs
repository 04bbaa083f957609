//! Supabase REST (PostgREST) implementation of [`CarrierStore`].

use crate::error::{CarrierError, CarrierResult};
use crate::model::{Carrier, CarrierFields, CarrierId, Page};
use crate::pagination::{self, PageRange};
use crate::store::CarrierStore;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, error, warn};

/// Remote table holding carrier rows.
pub const CARRIERS_TABLE: &str = "carriers";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// Supabase REST API client for the carriers table.
#[derive(Clone)]
pub struct SupabaseCarrierStore {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    bearer_token: String,
}

impl SupabaseCarrierStore {
    /// Create a new store client.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project API URL (e.g., `https://xyz.supabase.co`)
    /// * `api_key` - The Supabase publishable API key
    /// * `bearer_token` - User access token, or the publishable key for anonymous access
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        bearer_token: impl Into<String>,
    ) -> CarrierResult<Self> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        if !(api_url.starts_with("https://") || api_url.starts_with("http://")) {
            return Err(CarrierError::Config(format!(
                "Supabase URL must be http(s): {api_url}"
            )));
        }

        Ok(Self {
            http_client: reqwest::Client::new(),
            api_url,
            api_key: api_key.into(),
            bearer_token: bearer_token.into(),
        })
    }

    /// Build the REST API URL for the carriers table.
    fn rest_url(&self) -> String {
        format!("{}/rest/v1/{}", self.api_url, CARRIERS_TABLE)
    }

    /// Base request with authentication headers.
    fn request(&self, method: Method) -> RequestBuilder {
        self.http_client
            .request(method, self.rest_url())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer_token))
    }

    fn page_request(&self, range: PageRange) -> RequestBuilder {
        self.request(Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("order", "name.asc".to_string()),
                ("offset", range.from.to_string()),
                ("limit", range.row_count().to_string()),
            ])
            .header("Prefer", "count=exact")
    }

    fn all_request(&self) -> RequestBuilder {
        self.request(Method::GET)
            .query(&[("select", "*"), ("order", "name.asc")])
    }

    /// Single-object read: PostgREST answers 406 `PGRST116` when no row matches.
    fn by_id_request(&self, id: &CarrierId) -> RequestBuilder {
        self.request(Method::GET)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{id}"))])
            .header(reqwest::header::ACCEPT, SINGLE_OBJECT)
    }

    fn create_request(&self, fields: &CarrierFields) -> RequestBuilder {
        self.request(Method::POST)
            .header("Prefer", "return=representation")
            .json(fields)
    }

    fn update_request(&self, id: &CarrierId, fields: &CarrierFields) -> RequestBuilder {
        self.request(Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(fields)
    }

    fn delete_request(&self, id: &CarrierId) -> RequestBuilder {
        self.request(Method::DELETE)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
    }

    /// Turn a non-success response into the matching [`CarrierError`].
    async fn check_response(
        &self,
        response: Response,
        id: Option<&CarrierId>,
    ) -> CarrierResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error!(status, %body, "Supabase request failed");
        Err(CarrierError::from_response(
            status,
            &body,
            id.map(CarrierId::as_str),
        ))
    }

    async fn rows(&self, response: Response, id: Option<&CarrierId>) -> CarrierResult<Vec<Carrier>> {
        let response = self.check_response(response, id).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl CarrierStore for SupabaseCarrierStore {
    async fn fetch_page(&self, page: u32, page_size: u32) -> CarrierResult<Page> {
        let range = pagination::range_for(page, page_size);
        debug!(page, page_size, from = range.from, to = range.to, "Fetching carrier page");

        let response = self.page_request(range).send().await?;
        let total = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(pagination::parse_content_range);

        // Past the last row PostgREST answers 416 with `*/total`.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            debug!(page, ?total, "Requested page is past the end");
            return Ok(Page {
                items: Vec::new(),
                total: total.unwrap_or(0),
                page,
                page_size,
            });
        }

        let items = self.rows(response, None).await?;
        let total = total.ok_or_else(|| CarrierError::Store {
            status: 200,
            message: "response carried no exact row count".to_string(),
        })?;

        debug!(page, count = items.len(), total, "Fetched carrier page");
        Ok(Page {
            items,
            total,
            page,
            page_size,
        })
    }

    async fn fetch_all(&self) -> CarrierResult<Vec<Carrier>> {
        debug!("Fetching all carriers");
        let response = self.all_request().send().await?;
        self.rows(response, None).await
    }

    async fn fetch_by_id(&self, id: &CarrierId) -> CarrierResult<Carrier> {
        debug!(%id, "Fetching carrier");
        let response = self.by_id_request(id).send().await?;
        let response = self.check_response(response, Some(id)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn create(&self, fields: &CarrierFields) -> CarrierResult<Carrier> {
        debug!(name = %fields.name, "Creating carrier");
        let response = self.create_request(fields).send().await?;
        let created = self
            .rows(response, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CarrierError::Store {
                status: 201,
                message: "insert returned no representation".to_string(),
            })?;

        debug!(id = %created.id, "Carrier created");
        Ok(created)
    }

    async fn update(&self, id: &CarrierId, fields: &CarrierFields) -> CarrierResult<Carrier> {
        debug!(%id, name = %fields.name, "Updating carrier");
        let response = self.update_request(id, fields).send().await?;
        self.rows(response, Some(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CarrierError::NotFound { id: id.to_string() })
    }

    async fn delete(&self, id: &CarrierId) -> CarrierResult<bool> {
        debug!(%id, "Deleting carrier");
        let response = self.delete_request(id).send().await?;
        let removed = !self.rows(response, Some(id)).await?.is_empty();

        if !removed {
            warn!(%id, "Delete matched no rows; carrier already absent");
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for SupabaseCarrierStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseCarrierStore")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SupabaseCarrierStore {
        SupabaseCarrierStore::new("https://test.supabase.co/", "test-key", "user-token").unwrap()
    }

    fn query(request: &reqwest::Request) -> Vec<(String, String)> {
        request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn header<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_rest_url_strips_trailing_slash() {
        assert_eq!(
            store().rest_url(),
            "https://test.supabase.co/rest/v1/carriers"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            SupabaseCarrierStore::new("test.supabase.co", "k", "t"),
            Err(CarrierError::Config(_))
        ));
    }

    #[test]
    fn test_page_request_shape() {
        let request = store()
            .page_request(pagination::range_for(2, 12))
            .build()
            .unwrap();

        assert_eq!(request.method(), Method::GET);
        let pairs = query(&request);
        assert!(pairs.contains(&("order".into(), "name.asc".into())));
        assert!(pairs.contains(&("offset".into(), "12".into())));
        assert!(pairs.contains(&("limit".into(), "12".into())));
        assert_eq!(header(&request, "Prefer"), Some("count=exact"));
        assert_eq!(header(&request, "apikey"), Some("test-key"));
        assert_eq!(header(&request, "Authorization"), Some("Bearer user-token"));
    }

    #[test]
    fn test_all_request_is_sorted_and_unbounded() {
        let request = store().all_request().build().unwrap();
        let pairs = query(&request);
        assert!(pairs.contains(&("order".into(), "name.asc".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "limit"));
    }

    #[test]
    fn test_id_filters_are_encoded() {
        let id = CarrierId::new("a&b");
        let request = store().by_id_request(&id).build().unwrap();
        assert!(query(&request).contains(&("id".into(), "eq.a&b".into())));
        assert_eq!(header(&request, "Accept"), Some(SINGLE_OBJECT));
    }

    #[test]
    fn test_write_requests_ask_for_representation() {
        let id = CarrierId::new("7");
        let fields = CarrierFields::new("Acme");
        let s = store();

        let create = s.create_request(&fields).build().unwrap();
        assert_eq!(create.method(), Method::POST);
        assert_eq!(header(&create, "Prefer"), Some("return=representation"));
        let body = create.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(body, br#"{"name":"Acme"}"#);

        let update = s.update_request(&id, &fields).build().unwrap();
        assert_eq!(update.method(), Method::PATCH);
        assert!(query(&update).contains(&("id".into(), "eq.7".into())));

        let delete = s.delete_request(&id).build().unwrap();
        assert_eq!(delete.method(), Method::DELETE);
        assert_eq!(header(&delete, "Prefer"), Some("return=representation"));
    }

    #[test]
    fn test_debug_hides_credentials() {
        let rendered = format!("{:?}", store());
        assert!(rendered.contains("test.supabase.co"));
        assert!(!rendered.contains("user-token"));
    }

    /// Serve one canned HTTP response on a local port and return the base URL.
    async fn serve_once(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
            body.len()
        );
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str("\r\n");
        response.push_str(body);

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();

            // Drain the request (head plus any body) before answering.
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{addr}")
    }

    fn local_store(base_url: &str) -> SupabaseCarrierStore {
        SupabaseCarrierStore {
            http_client: reqwest::Client::builder().no_proxy().build().unwrap(),
            api_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            bearer_token: "user-token".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_reads_exact_total() {
        let url = serve_once(
            "206 Partial Content",
            &[("Content-Range", "12-12/13")],
            r#"[{"id":13,"name":"Zephyr Freight"}]"#,
        )
        .await;

        let page = local_store(&url).fetch_page(2, 12).await.unwrap();

        assert_eq!(page.total, 13);
        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id.as_str(), "13");
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty_not_error() {
        let url = serve_once(
            "416 Range Not Satisfiable",
            &[("Content-Range", "*/13")],
            r#"{"code":"PGRST103","message":"Requested range not satisfiable"}"#,
        )
        .await;

        let page = local_store(&url).fetch_page(5, 12).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 13);
        assert_eq!(page.page, 5);
    }

    #[tokio::test]
    async fn test_page_without_content_range_is_store_error() {
        let url = serve_once("200 OK", &[], "[]").await;

        let err = local_store(&url).fetch_page(1, 12).await.unwrap_err();
        assert!(matches!(err, CarrierError::Store { .. }));
    }

    #[tokio::test]
    async fn test_fetch_by_id_miss_is_not_found() {
        let url = serve_once(
            "406 Not Acceptable",
            &[],
            r#"{"code":"PGRST116","message":"JSON object requested, multiple (or no) rows returned"}"#,
        )
        .await;

        let err = local_store(&url)
            .fetch_by_id(&CarrierId::new("404"))
            .await
            .unwrap_err();
        match err {
            CarrierError::NotFound { id } => assert_eq!(id, "404"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_by_id_reads_single_object() {
        let url = serve_once("200 OK", &[], r#"{"id":"7","name":"Acme"}"#).await;

        let carrier = local_store(&url)
            .fetch_by_id(&CarrierId::new("7"))
            .await
            .unwrap();
        assert_eq!(carrier.name, "Acme");
    }

    #[tokio::test]
    async fn test_update_without_rows_is_not_found() {
        let url = serve_once("200 OK", &[], "[]").await;

        let err = local_store(&url)
            .update(&CarrierId::new("9"), &CarrierFields::new("Acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, CarrierError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_was_removed() {
        let url = serve_once("200 OK", &[], "[]").await;
        assert!(!local_store(&url).delete(&CarrierId::new("9")).await.unwrap());

        let url = serve_once("200 OK", &[], r#"[{"id":"9","name":"Acme"}]"#).await;
        assert!(local_store(&url).delete(&CarrierId::new("9")).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_unique_violation_is_validation() {
        let url = serve_once(
            "409 Conflict",
            &[],
            r#"{"code":"23505","message":"duplicate key value violates unique constraint \"carriers_name_key\""}"#,
        )
        .await;

        let err = local_store(&url)
            .create(&CarrierFields::new("Acme"))
            .await
            .unwrap_err();
        match err {
            CarrierError::Validation(message) => assert!(message.contains("duplicate key")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permission_failure_is_store_error() {
        let url = serve_once(
            "401 Unauthorized",
            &[],
            r#"{"code":"42501","message":"permission denied for table carriers"}"#,
        )
        .await;

        match local_store(&url).fetch_all().await.unwrap_err() {
            CarrierError::Store { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected Store, got {other:?}"),
        }
    }
}
