use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use tracing::debug;

use crate::{PubflowError, Result, model::CredentialRecord};

/// Outcome reported by a reachability check.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Reachability {
    pub reachable: bool,
    pub detail: String,
}

impl Reachability {
    pub fn reachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: true,
            detail: detail.into(),
        }
    }

    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self {
            reachable: false,
            detail: detail.into(),
        }
    }
}

/// External check that a credential record can reach its storage provider.
///
/// Errors are reported to the caller of `test` as a non-success result,
/// never raised.
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    async fn check(
        &self,
        record: &CredentialRecord,
    ) -> Result<Reachability>;
}

/// Probes an HTTP endpoint with the access token as bearer; any 2xx is reachable.
#[derive(Debug, Clone)]
pub struct HttpReachability {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpReachability {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl ReachabilityCheck for HttpReachability {
    async fn check(
        &self,
        record: &CredentialRecord,
    ) -> Result<Reachability> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", record.access_token)).map_err(|err| PubflowError::Reachability(err.to_string()))?,
        );

        let res = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| PubflowError::Reachability(format!("Http error: {}", err)))?;

        let status = res.status();
        debug!("reachability check {} -> {}", self.endpoint, status);
        if status.is_success() {
            Ok(Reachability::reachable("connection succeeded"))
        } else {
            let body = res.text().await.unwrap_or_default();
            let body: String = body.chars().take(200).collect();
            Ok(Reachability::unreachable(format!("{}: {}", status, body.trim())))
        }
    }
}

#[cfg(test)]
mod test {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;

    /// Serves one canned HTTP response and returns the request it received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let response = format!("HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}", status_line, body.len(), body);
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf[..n]).to_string()
        });
        (format!("http://{}/2/users/get_current_account", addr), handle)
    }

    fn checker(url: String) -> HttpReachability {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpReachability::with_client(client, url, Duration::from_secs(5))
    }

    fn record() -> CredentialRecord {
        CredentialRecord::new("key", "secret", "sl.access", "refresh")
    }

    #[tokio::test]
    async fn test_success_status_is_reachable() {
        let (url, server) = serve_once("200 OK", "{}").await;
        let check = checker(url);
        let res = check.check(&record()).await.unwrap();
        assert!(res.reachable);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /2/users/get_current_account"));
        assert!(request.contains("authorization: bearer sl.access"));
    }

    #[tokio::test]
    async fn test_error_status_is_unreachable() {
        let (url, server) = serve_once("401 Unauthorized", "invalid_access_token").await;
        let check = checker(url);
        let res = check.check(&record()).await.unwrap();
        assert!(!res.reachable);
        assert!(res.detail.contains("401"));
        assert!(res.detail.contains("invalid_access_token"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check = checker(format!("http://{}/", addr));
        assert!(matches!(check.check(&record()).await, Err(PubflowError::Reachability(_))));
    }
}
