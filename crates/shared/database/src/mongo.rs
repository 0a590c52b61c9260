//! MongoDB configuration read from `MONGODB_*` variables and, with the
//! `mongodb` feature, the client wrapper.

use std::time::Duration;

use common::{util::encode_component as encode, ConfigError, EnvReader, FromEnv};

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    /// Idle time after which a pooled connection is closed
    pub conn_max_lifetime: Duration,
    pub max_idle_connections: u32,
    pub max_open_connections: u32,
    pub app_name: Option<String>,
    pub replica_set: Option<String>,
    pub tls_mode: bool,
    pub tls_insecure: bool,
    pub retry_writes: bool,
    pub direct_connection: bool,
    /// Collections opened on connect
    pub collections: Vec<String>,
}

impl FromEnv for MongoConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("MONGODB_");

        Ok(Self {
            host: env.required("HOST")?,
            port: env.required_parse("PORT")?,
            database: env.required("DATABASE")?,
            username: env.take_secret("USERNAME"),
            password: env.take_secret("PASSWORD"),
            timeout: env.duration_or("TIMEOUT", Duration::from_secs(10))?,
            conn_max_lifetime: env.duration_or("CONN_MAX_LIFETIME", Duration::from_secs(3600))?,
            max_idle_connections: env.parse_or("MAX_IDLE_CONNECTIONS", 10)?,
            max_open_connections: env.parse_or("MAX_OPEN_CONNECTIONS", 100)?,
            app_name: env.string("APP_NAME"),
            replica_set: env.string("REPLICA_SET"),
            tls_mode: env.bool_or("TLS_MODE", false)?,
            tls_insecure: env.bool_or("TLS_INSECURE", false)?,
            retry_writes: env.bool_or("RETRY_WRITES", false)?,
            direct_connection: env.bool_or("DIRECT_CONNECTION", true)?,
            collections: env.list("COLLECTIONS"),
        })
    }
}

impl MongoConfig {
    /// Connection URI with percent-encoded credentials and the TLS flags.
    /// `tlsInsecure` is only sent with TLS on.
    pub fn uri(&self) -> String {
        let credentials = match (&self.username, &self.password) {
            (Some(user), Some(password)) => format!("{}:{}@", encode(user), encode(password)),
            (Some(user), None) => format!("{}@", encode(user)),
            _ => String::new(),
        };

        let mut uri = format!(
            "mongodb://{}{}:{}/?tls={}",
            credentials, self.host, self.port, self.tls_mode
        );
        if self.tls_mode {
            uri.push_str(&format!("&tlsInsecure={}", self.tls_insecure));
        }
        uri
    }
}

#[cfg(feature = "mongodb")]
pub use client::MongoDatabase;

#[cfg(feature = "mongodb")]
mod client {
    use std::collections::HashMap;

    use mongodb::{
        bson::{doc, Document},
        options::ClientOptions,
        Client, Collection, Database,
    };

    use super::MongoConfig;
    use crate::error::{DatabaseError, DatabaseResult};

    /// MongoDB client with the configured database and collections.
    #[derive(Clone)]
    pub struct MongoDatabase {
        client: Client,
        database: Database,
        collections: HashMap<String, Collection<Document>>,
        timeout: std::time::Duration,
    }

    impl MongoDatabase {
        /// Create the client, ping the server and open the configured collections.
        pub async fn connect(config: &MongoConfig) -> DatabaseResult<Self> {
            let options = client_options(config).await.map_err(|e| {
                tracing::error!(error = %e, "error while preparing MongoDB connection");
                e
            })?;
            let client = Client::with_options(options).map_err(|e| {
                tracing::error!(error = %e, "error while connecting to MongoDB");
                DatabaseError::from(e)
            })?;

            let database = client.database(&config.database);
            let collections = config
                .collections
                .iter()
                .map(|name| (name.clone(), database.collection::<Document>(name)))
                .collect();

            let db = Self {
                client,
                database,
                collections,
                timeout: config.timeout,
            };
            db.ping().await.map_err(|e| {
                tracing::error!(error = %e, "error while pinging the MongoDB connection");
                e
            })?;

            tracing::info!("Connection to MongoDB server was started.");
            Ok(db)
        }

        pub fn client(&self) -> &Client {
            &self.client
        }

        pub fn database(&self) -> &Database {
            &self.database
        }

        /// A collection opened on connect.
        pub fn collection(&self, name: &str) -> Option<&Collection<Document>> {
            self.collections.get(name)
        }

        pub fn collections(&self) -> &HashMap<String, Collection<Document>> {
            &self.collections
        }

        /// Run the `ping` command within the configured timeout.
        pub async fn ping(&self) -> DatabaseResult<()> {
            let ping = self.database.run_command(doc! { "ping": 1 });
            tokio::time::timeout(self.timeout, ping)
                .await
                .map_err(|_| DatabaseError::PingTimeout(self.timeout))??;
            Ok(())
        }

        /// Close the client and wait for its connections to drop.
        pub async fn close(self) {
            self.client.shutdown().await;
            tracing::info!("Connection to MongoDB server was closed.");
        }
    }

    pub(super) async fn client_options(config: &MongoConfig) -> DatabaseResult<ClientOptions> {
        let mut options = ClientOptions::parse(config.uri()).await?;
        options.direct_connection = Some(config.direct_connection);
        options.retry_writes = Some(config.retry_writes);
        options.repl_set_name = config.replica_set.clone();
        options.app_name = config.app_name.clone();
        options.max_idle_time = Some(config.conn_max_lifetime);
        options.max_pool_size = Some(config.max_idle_connections);
        options.max_connecting = Some(config.max_open_connections);
        options.connect_timeout = Some(config.timeout);
        options.server_selection_timeout = Some(config.timeout);
        Ok(options)
    }
}
