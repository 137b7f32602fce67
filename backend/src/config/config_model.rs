#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: AuthSecret,
    /// `None` when billing is not configured; billing endpoints then report Unavailable.
    pub stripe: Option<StripeSecrets>,
    pub app: AppSettings,
    pub revocation_purge: RevocationPurge,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    /// MiB
    pub body_limit: u64,
    /// seconds
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct StripeSecrets {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub base_url: String,
    pub cors_allowed_origin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RevocationPurge {
    pub interval_secs: u64,
}
