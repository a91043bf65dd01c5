//! PostgREST gateway for the hosted data service.
//!
//! Requests follow the PostgREST conventions:
//! - select: `GET /rest/v1/<table>?select=*&<col>=eq.<v>&order=<col>.asc`
//! - upsert: `POST /rest/v1/<table>?on_conflict=<cols>` with
//!   `Prefer: resolution=merge-duplicates,return=representation`
//! - delete: `DELETE /rest/v1/<table>?<col>=eq.<v>`
//!
//! Every request carries the project's anon key; once a user signs in, the
//! session's access token replaces it in the `Authorization` header.

use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;

use super::{Filter, GatewayError, Query, RemoteGateway, Row};
use crate::config::RemoteConfig;

const REST_PATH: &str = "/rest/v1";

/// Gateway speaking PostgREST over HTTP.
#[derive(Debug)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl HttpGateway {
    /// Creates a new gateway with explicit parameters.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
        }
    }

    /// Creates a gateway from config.
    ///
    /// Returns an error if remote access is not configured.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, GatewayError> {
        let url = config.url.clone().ok_or(GatewayError::NotConfigured)?;
        let anon_key = config.anon_key.clone().ok_or(GatewayError::NotConfigured)?;
        Ok(Self::new(url, anon_key))
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sets or clears the signed-in user's access token.
    pub fn set_access_token(&self, token: Option<String>) {
        let mut guard = self.access_token.write().unwrap_or_else(|e| e.into_inner());
        *guard = token;
    }

    fn bearer(&self) -> String {
        let guard = self.access_token.read().unwrap_or_else(|e| e.into_inner());
        format!("Bearer {}", guard.as_deref().unwrap_or(&self.anon_key))
    }

    /// Builds the table endpoint URL with the given query parameters.
    fn build_url(&self, table: &str, params: &[(String, String)]) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = if base.starts_with("http://") || base.starts_with("https://") {
            base.to_string()
        } else {
            format!("https://{}", base)
        };

        let mut url = format!("{}{}/{}", base, REST_PATH, table);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
        filters
            .iter()
            .map(|f| (f.column.clone(), format!("{}.{}", f.op.as_str(), f.value_text())))
            .collect()
    }

    fn select_params(query: &Query) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(Self::filter_params(&query.filters));
        if !query.order.is_empty() {
            let order = query
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_string(), order));
        }
        params
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.bearer())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GatewayError::Rejected {
            status: status.as_u16(),
            message: error_message(&body).unwrap_or_else(|| format!("Server returned status {}", status)),
        })
    }

    async fn read_rows(response: reqwest::Response) -> Result<Vec<Row>, GatewayError> {
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&body) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Ok(vec![other]),
            Err(e) => Err(GatewayError::Decode(format!("response body: {}", e))),
        }
    }
}

/// Pulls the human-readable `message` out of a PostgREST error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error_description"))
        .or_else(|| value.get("msg"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, GatewayError> {
        let url = self.build_url(table, &Self::select_params(query));
        tracing::debug!("GET {}", url);
        let response = self.send(self.request(reqwest::Method::GET, &url)).await?;
        Self::read_rows(response).await
    }

    async fn upsert(
        &self,
        table: &str,
        rows: Vec<Row>,
        conflict_keys: &[&str],
    ) -> Result<Vec<Row>, GatewayError> {
        let mut params = Vec::new();
        if !conflict_keys.is_empty() {
            params.push(("on_conflict".to_string(), conflict_keys.join(",")));
        }
        let url = self.build_url(table, &params);
        tracing::debug!("POST {} ({} row(s))", url, rows.len());

        let builder = self
            .request(reqwest::Method::POST, &url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&rows);
        let response = self.send(builder).await?;
        Self::read_rows(response).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), GatewayError> {
        let url = self.build_url(table, &Self::filter_params(filters));
        tracing::debug!("DELETE {}", url);
        self.send(self.request(reqwest::Method::DELETE, &url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_select_url() {
        let gateway = HttpGateway::new("https://project.supabase.co/", "anon");
        let query = Query::new()
            .eq("surah", 2)
            .gte("ayah", 1)
            .lte("ayah", 5)
            .order("surah", true)
            .order("ayah", true)
            .order("position", true);

        let url = gateway.build_url("translation", &HttpGateway::select_params(&query));
        assert_eq!(
            url,
            "https://project.supabase.co/rest/v1/translation?select=%2A&surah=eq.2\
             &ayah=gte.1&ayah=lte.5&order=surah.asc%2Cayah.asc%2Cposition.asc"
        );
    }

    #[test]
    fn test_build_url_bare_host() {
        let gateway = HttpGateway::new("localhost:54321", "anon");
        assert_eq!(
            gateway.build_url("notes", &[]),
            "https://localhost:54321/rest/v1/notes"
        );

        let gateway = HttpGateway::new("http://localhost:54321", "anon");
        assert_eq!(
            gateway.build_url("notes", &[]),
            "http://localhost:54321/rest/v1/notes"
        );
    }

    #[test]
    fn test_filter_params_render_uuid_strings() {
        let params = HttpGateway::filter_params(&[Filter::eq(
            "user_id",
            "7d3c1f9e-0000-0000-0000-000000000000",
        )]);
        assert_eq!(
            params,
            vec![(
                "user_id".to_string(),
                "eq.7d3c1f9e-0000-0000-0000-000000000000".to_string()
            )]
        );
    }

    #[test]
    fn test_bearer_prefers_access_token() {
        let gateway = HttpGateway::new("https://x.supabase.co", "anon-key");
        assert_eq!(gateway.bearer(), "Bearer anon-key");

        gateway.set_access_token(Some("user-jwt".to_string()));
        assert_eq!(gateway.bearer(), "Bearer user-jwt");

        gateway.set_access_token(None);
        assert_eq!(gateway.bearer(), "Bearer anon-key");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"code":"23505","message":"duplicate key value"}"#),
            Some("duplicate key value".to_string())
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_from_config_requires_url_and_key() {
        let config = RemoteConfig {
            url: Some("https://x.supabase.co".into()),
            anon_key: None,
        };
        assert!(matches!(
            HttpGateway::from_config(&config),
            Err(GatewayError::NotConfigured)
        ));

        let config = RemoteConfig {
            url: Some("https://x.supabase.co".into()),
            anon_key: Some("anon".into()),
        };
        let gateway = HttpGateway::from_config(&config).unwrap();
        assert_eq!(gateway.base_url(), "https://x.supabase.co");
    }
}
