//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use tabauth_config::AccountStore;
use tabauth_server::{Server, ServerConfig, TlsConfig};
use tabauth_trusted::TrustedClient;

/// Caller account every test server accepts.
pub const USERNAME: &str = "foo";
pub const PASSWORD: &str = "bar";

/// A gateway running in the background in front of a mock trusted-auth service.
pub struct TestServer {
    /// The gateway's address.
    pub addr: SocketAddr,
    /// HTTP client for talking to the gateway.
    pub client: Client,
    /// `http` or `https`.
    pub scheme: &'static str,
    /// The mock trusted-auth service.
    pub trusted: MockServer,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a gateway whose trusted-auth service echoes the submitted form.
    pub async fn start() -> Result<Self> {
        let trusted = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trusted"))
            .respond_with(echo_form)
            .mount(&trusted)
            .await;
        Self::start_with(trusted).await
    }

    /// Start a gateway in front of a preconfigured mock service.
    pub async fn start_with(trusted: MockServer) -> Result<Self> {
        let endpoint = trusted.uri();
        Self::start_with_endpoint(trusted, &endpoint).await
    }

    /// Start an HTTPS gateway using the self-signed fixture certificate.
    pub async fn start_tls() -> Result<Self> {
        let trusted = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trusted"))
            .respond_with(echo_form)
            .mount(&trusted)
            .await;
        let endpoint = trusted.uri();
        Self::start_with_options(trusted, &endpoint, Some(fixture_tls())).await
    }

    /// Start a gateway pointed at `endpoint`, keeping `trusted` alive alongside it.
    pub async fn start_with_endpoint(trusted: MockServer, endpoint: &str) -> Result<Self> {
        Self::start_with_options(trusted, endpoint, None).await
    }

    async fn start_with_options(
        trusted: MockServer,
        endpoint: &str,
        tls: Option<TlsConfig>,
    ) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let accounts: AccountStore = [(USERNAME.to_string(), PASSWORD.to_string())]
            .into_iter()
            .collect();
        let tickets = Arc::new(TrustedClient::new(endpoint)?);
        let mut config = ServerConfig::new(addr).with_request_logging(false);
        let scheme = match tls {
            Some(tls) => {
                config = config.with_tls(tls);
                "https"
            }
            None => "http",
        };

        let (tx, rx) = oneshot::channel::<()>();
        let server = Server::new(config, accounts, tickets);
        let handle = tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        // The fixture certificate is self-signed.
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        wait_for_server(&client, &format!("{}://{}/", scheme, addr)).await?;

        Ok(Self {
            addr,
            client,
            scheme,
            trusted,
            shutdown: Some(tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL for the gateway.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    /// Get a request builder carrying the valid test credentials.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.get_as(path, USERNAME, PASSWORD)
    }

    /// Get a request builder carrying arbitrary credentials.
    pub fn get_as(&self, path: &str, username: &str, password: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .basic_auth(username, Some(password))
    }

    /// Get a request builder without credentials.
    pub fn get_anonymous(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// Number of requests the mock trusted-auth service has received.
    pub async fn trusted_calls(&self) -> usize {
        self.trusted
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    /// Stop the gateway and wait for it to drain.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            timeout(Duration::from_secs(5), handle).await??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Echo the submitted form back followed by a newline.
pub fn echo_form(req: &Request) -> ResponseTemplate {
    let mut body = req.body.clone();
    body.push(b'\n');
    ResponseTemplate::new(200).set_body_bytes(body)
}

/// TLS files under `tests/fixtures`.
pub fn fixture_tls() -> TlsConfig {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    TlsConfig::new(dir.join("cert.pem"), dir.join("key.pem"))
}

/// A trusted-auth stand-in that promises a 100-byte body, sends 3 bytes,
/// then closes the connection. Serves any number of connections.
pub async fn truncated_downstream() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(9).any(|w| w == b"username=") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nabc")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });

    Ok(addr)
}

/// Wait until the gateway accepts connections. Any HTTP response counts.
async fn wait_for_server(client: &Client, url: &str) -> Result<()> {
    timeout(Duration::from_secs(5), async {
        loop {
            if client.get(url).send().await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;

    Ok(())
}
