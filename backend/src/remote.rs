use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use futures::stream::{BoxStream, StreamExt};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow, PgSslMode};
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use tracing::{debug, info};
use poll_shared::models::VoteRecord;
use crate::connection::{ConnectionError, ConnectionHandle, Connector, StoreCredentials};
use crate::store::{StoreError, VoteRepository};

const MAX_CONNECTIONS: u32 = 5;

const INSERT_VOTE: &str =
    "INSERT INTO votes (name, properties, wishes, insider) VALUES ($1, $2, $3, $4)";

const SELECT_VOTES: &str =
    "SELECT name, properties, wishes, insider, created_at FROM votes ORDER BY id";

pub struct PgConnector {
    acquire_timeout: Duration,
}

impl PgConnector {
    pub fn new(acquire_timeout: Duration) -> Self {
        Self { acquire_timeout }
    }
}

pub fn connect_options(credentials: &StoreCredentials) -> Result<PgConnectOptions, ConnectionError> {
    let mut options = match &credentials.url {
        Some(url) => PgConnectOptions::from_str(url)
            .map_err(|e| ConnectionError::CredentialParse(e.to_string()))?,
        None => PgConnectOptions::new(),
    };

    if let Some(host) = &credentials.host {
        options = options.host(host);
    }
    if let Some(port) = credentials.port {
        options = options.port(port);
    }
    if let Some(database) = &credentials.database {
        options = options.database(database);
    }
    if let Some(username) = &credentials.username {
        options = options.username(username);
    }
    if let Some(password) = &credentials.password {
        options = options.password(password);
    }
    if let Some(pem) = &credentials.ssl_root_cert {
        options = options
            .ssl_mode(PgSslMode::VerifyFull)
            .ssl_root_cert_from_pem(pem.as_bytes().to_vec());
    }

    Ok(options)
}

#[rocket::async_trait]
impl Connector for PgConnector {
    async fn connect(&self, credentials: StoreCredentials) -> Result<ConnectionHandle, ConnectionError> {
        let options = connect_options(&credentials)?;

        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;

        info!("📋 Migrations complete");
        Ok(ConnectionHandle::new(Arc::new(RemoteRepository::new(pool))))
    }
}

pub struct RemoteRepository {
    pool: PgPool,
}

impl RemoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn vote_from_row(row: &PgRow) -> Result<VoteRecord, sqlx::Error> {
    Ok(VoteRecord {
        name: row.try_get("name")?,
        properties: row.try_get("properties")?,
        wishes: row.try_get("wishes")?,
        insider: row.try_get("insider")?,
        timestamp: row.try_get::<Option<OffsetDateTime>, _>("created_at")?,
    })
}

#[rocket::async_trait]
impl VoteRepository for RemoteRepository {
    async fn append(&self, record: &VoteRecord) -> Result<(), StoreError> {
        sqlx::query(INSERT_VOTE)
            .bind(&record.name)
            .bind(&record.properties)
            .bind(&record.wishes)
            .bind(&record.insider)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        debug!("Vote appended to remote store");
        Ok(())
    }

    fn stream(&self) -> BoxStream<'_, Result<VoteRecord, StoreError>> {
        sqlx::query(SELECT_VOTES)
            .fetch(&self.pool)
            .map(|row| {
                row.and_then(|row| vote_from_row(&row))
                    .map_err(|e| StoreError::Backend(e.to_string()))
            })
            .boxed()
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}
