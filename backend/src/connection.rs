use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{error, info, warn};
use crate::store::VoteRepository;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Credential material is not valid: {0}")]
    CredentialParse(String),
    #[error("Credential material is missing `{0}`")]
    MissingField(&'static str),
    #[error("Could not connect: {0}")]
    Connect(String),
    #[error("Connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// The `textkey` entry as it arrives from configuration: a JSON document in a
/// string (secrets, env) or an already structured table (Rocket.toml).
#[derive(Clone, Deserialize)]
#[serde(untagged)]
pub enum CredentialSource {
    JsonString(String),
    StructuredMap(Map<String, Value>),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::JsonString(_) => f.write_str("JsonString(<redacted>)"),
            CredentialSource::StructuredMap(map) => {
                f.debug_tuple("StructuredMap").field(&map.keys().collect::<Vec<_>>()).finish()
            }
        }
    }
}

impl CredentialSource {
    /// An empty secret counts as no configuration at all.
    pub fn is_blank(&self) -> bool {
        match self {
            CredentialSource::JsonString(raw) => raw.trim().is_empty(),
            CredentialSource::StructuredMap(map) => map.is_empty(),
        }
    }

    pub fn to_map(&self) -> Result<Map<String, Value>, ConnectionError> {
        match self {
            CredentialSource::JsonString(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => Ok(map),
                Ok(_) => Err(ConnectionError::CredentialParse("expected a JSON object".into())),
                Err(e) => Err(ConnectionError::CredentialParse(e.to_string())),
            },
            CredentialSource::StructuredMap(map) => Ok(map.clone()),
        }
    }

    pub fn to_credentials(&self) -> Result<StoreCredentials, ConnectionError> {
        let credentials: StoreCredentials = serde_json::from_value(Value::Object(self.to_map()?))
            .map_err(|e| ConnectionError::CredentialParse(e.to_string()))?;
        credentials.validate()?;
        Ok(credentials)
    }
}

/// Service-account style credentials for the vote database.
#[derive(Clone, Default, Deserialize, PartialEq)]
pub struct StoreCredentials {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "project_id")]
    pub database: Option<String>,
    #[serde(default, alias = "user")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default, alias = "certificate")]
    pub ssl_root_cert: Option<String>,
}

impl fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("has_url", &self.url.is_some())
            .field("has_password", &self.password.is_some())
            .field("has_certificate", &self.ssl_root_cert.is_some())
            .finish()
    }
}

impl StoreCredentials {
    fn validate(&self) -> Result<(), ConnectionError> {
        if self.url.is_none() && self.host.is_none() {
            return Err(ConnectionError::MissingField("host"));
        }
        Ok(())
    }
}

/// Capability meaning "the remote store is reachable".
#[derive(Clone)]
pub struct ConnectionHandle {
    repository: Arc<dyn VoteRepository>,
}

impl ConnectionHandle {
    pub fn new(repository: Arc<dyn VoteRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn VoteRepository {
        self.repository.as_ref()
    }

    pub fn same_as(&self, other: &ConnectionHandle) -> bool {
        Arc::ptr_eq(&self.repository, &other.repository)
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("backend", &self.repository.kind())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    ClientMissing,
    ConfigurationMissing,
    CredentialParse(String),
    Connection(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::ClientMissing => f.write_str("store client not compiled in"),
            UnavailableReason::ConfigurationMissing => f.write_str("no `textkey` credentials configured"),
            UnavailableReason::CredentialParse(e) => write!(f, "credentials unreadable: {}", e),
            UnavailableReason::Connection(e) => write!(f, "connection failed: {}", e),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConnectionResult {
    Connected(ConnectionHandle),
    Unavailable(UnavailableReason),
}

impl ConnectionResult {
    pub fn handle(&self) -> Option<&ConnectionHandle> {
        match self {
            ConnectionResult::Connected(handle) => Some(handle),
            ConnectionResult::Unavailable(_) => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.handle().is_some()
    }
}

/// Opens the remote store from normalised credentials.
#[rocket::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: StoreCredentials) -> Result<ConnectionHandle, ConnectionError>;
}

/// Resolves the store connection once per process and remembers the outcome,
/// success or failure, for every later caller.
pub struct ConnectionResolver {
    source: Option<CredentialSource>,
    connector: Option<Box<dyn Connector>>,
    connect_timeout: Duration,
    outcome: OnceCell<ConnectionResult>,
}

impl ConnectionResolver {
    pub fn new(
        source: Option<CredentialSource>,
        connector: Option<Box<dyn Connector>>,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            source,
            connector,
            connect_timeout,
            outcome: OnceCell::new(),
        }
    }

    /// Uses the database connector when the `remote` feature is compiled in.
    pub fn with_default_connector(source: Option<CredentialSource>, connect_timeout: Duration) -> Self {
        #[cfg(feature = "remote")]
        let connector: Option<Box<dyn Connector>> =
            Some(Box::new(crate::remote::PgConnector::new(connect_timeout)));
        #[cfg(not(feature = "remote"))]
        let connector: Option<Box<dyn Connector>> = None;

        Self::new(source, connector, connect_timeout)
    }

    pub async fn resolve(&self) -> &ConnectionResult {
        self.outcome.get_or_init(|| self.establish()).await
    }

    pub async fn handle(&self) -> Option<ConnectionHandle> {
        self.resolve().await.handle().cloned()
    }

    async fn establish(&self) -> ConnectionResult {
        let Some(connector) = &self.connector else {
            warn!("Vote store client unavailable - running in offline mode");
            return ConnectionResult::Unavailable(UnavailableReason::ClientMissing);
        };

        let Some(source) = self.source.as_ref().filter(|source| !source.is_blank()) else {
            warn!("No `textkey` configured - running in offline mode");
            return ConnectionResult::Unavailable(UnavailableReason::ConfigurationMissing);
        };

        let credentials = match source.to_credentials() {
            Ok(credentials) => credentials,
            Err(e) => {
                error!("Failed to read store credentials: {}", e);
                return ConnectionResult::Unavailable(UnavailableReason::CredentialParse(e.to_string()));
            }
        };

        match tokio::time::timeout(self.connect_timeout, connector.connect(credentials)).await {
            Ok(Ok(handle)) => {
                info!("Connected to vote store ({})", handle.repository().kind());
                ConnectionResult::Connected(handle)
            }
            Ok(Err(e)) => {
                error!("Vote store connection failed: {}", e);
                ConnectionResult::Unavailable(UnavailableReason::Connection(e.to_string()))
            }
            Err(_) => {
                let e = ConnectionError::Timeout(self.connect_timeout);
                error!("Vote store connection failed: {}", e);
                ConnectionResult::Unavailable(UnavailableReason::Connection(e.to_string()))
            }
        }
    }
}
