//! Sink connection settings, loaded from the environment.

const DEFAULT_DATABASE: &str = "lanwatch";
const DEFAULT_PORT: u16 = 5432;

/// Configuration for connecting to the PostgreSQL sink.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl SinkConfig {
    /// Load sink settings from `DB_HOST`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_NAME` and `DB_PORT`.
    ///
    /// Host, user and password are required; if any is missing the sink is
    /// considered unconfigured and `None` is returned. An unparseable port
    /// falls back to the default rather than failing.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("DB_HOST").ok()?;
        let user = std::env::var("DB_USER").ok()?;
        let password = std::env::var("DB_PASSWORD").ok()?;
        let database =
            std::env::var("DB_NAME").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let port = std::env::var("DB_PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        Some(Self {
            host,
            port,
            user,
            password,
            database,
        })
    }
}
