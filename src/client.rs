//! CollectionClient construction, configuration and lifecycle.

use crate::error::{CollectionError, Result};
use crate::model::ModelDescriptor;
use crate::transport::{CollectionTransport, GrpcTransport};
use serde::Deserialize;
use std::time::Duration;

/// Default collection server port.
pub const DEFAULT_PORT: u16 = 50051;

/// Options for connecting to a collection server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Server host name or address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: Some(30_000),
            request_timeout_ms: None,
        }
    }
}

impl ClientOptions {
    /// Create a new ClientOptions with defaults.
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Parse options from an address such as `host:port?connectTimeoutMS=5000`.
    ///
    /// A `grpc://` or `http://` scheme prefix is accepted and ignored.
    pub fn parse(address: &str) -> Result<Self> {
        let mut options = ClientOptions::default();

        let without_scheme = address
            .strip_prefix("grpc://")
            .or_else(|| address.strip_prefix("http://"))
            .unwrap_or(address);
        let (authority, query) = match without_scheme.split_once('?') {
            Some((authority, query)) => (authority, Some(query)),
            None => (without_scheme, None),
        };
        let authority = authority.trim_end_matches('/');

        match authority.rsplit_once(':') {
            Some((host, port)) => {
                options.port = port.parse().map_err(|_| {
                    CollectionError::connection(format!("invalid port in address: {address}"))
                })?;
                if !host.is_empty() {
                    options.host = host.to_string();
                }
            }
            None if !authority.is_empty() => options.host = authority.to_string(),
            None => {}
        }

        for param in query.into_iter().flat_map(|q| q.split('&')) {
            if let Some((key, value)) = param.split_once('=') {
                match key {
                    "connectTimeoutMS" => {
                        if let Ok(v) = value.parse() {
                            options.connect_timeout_ms = Some(v);
                        }
                    }
                    "timeoutMS" => {
                        if let Ok(v) = value.parse() {
                            options.request_timeout_ms = Some(v);
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(options)
    }

    /// The URI the gRPC channel connects to.
    pub fn endpoint_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub(crate) fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Builder for ClientOptions.
#[derive(Debug, Clone, Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// Set the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout_ms(mut self, timeout: u64) -> Self {
        self.options.connect_timeout_ms = Some(timeout);
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout_ms(mut self, timeout: u64) -> Self {
        self.options.request_timeout_ms = Some(timeout);
        self
    }

    /// Build the options.
    pub fn build(self) -> ClientOptions {
        self.options
    }
}

/// A client for one logical unit of work against a collection server.
///
/// The client owns its transport exclusively and keeps no state between
/// calls. Results are validated against the bound domain model unless an
/// operation is told otherwise.
///
/// # Example
///
/// ```ignore
/// use collection_client::{ClientOptions, CollectionClient, ModelDescriptor};
///
/// let options = ClientOptions::parse("localhost:50051")?;
/// let client = CollectionClient::connect(&options, ModelDescriptor::of::<User>())?;
///
/// let res = client.insert_one(doc! { "name": "Ann" }).await;
/// if res.is_success() {
///     println!("inserted {}", res.id);
/// }
///
/// client.close();
/// ```
pub struct CollectionClient {
    pub(crate) transport: Box<dyn CollectionTransport>,
    pub(crate) model: ModelDescriptor,
}

impl CollectionClient {
    /// Open a gRPC channel to the server and bind it to a new client.
    ///
    /// The channel connects lazily, so an unreachable server is reported by
    /// the first operation rather than here.
    pub fn connect(options: &ClientOptions, model: ModelDescriptor) -> Result<Self> {
        let transport = GrpcTransport::open(options)?;
        Ok(Self::with_transport(transport, model))
    }

    /// Create a client over an existing transport (useful for testing).
    pub fn with_transport(
        transport: impl CollectionTransport + 'static,
        model: ModelDescriptor,
    ) -> Self {
        Self {
            transport: Box::new(transport),
            model,
        }
    }

    /// The domain model results are validated against.
    pub fn model(&self) -> &ModelDescriptor {
        &self.model
    }

    /// Close the client and release its transport.
    pub fn close(self) {
        self.transport.close();
    }
}

impl std::fmt::Debug for CollectionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionClient")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}
