use std::str::FromStr;

use anyhow::{Context, Result};

use super::config_model::{
    AppSettings, AuthSecret, BackendServer, Database, DotEnvyConfig, RevocationPurge,
    StripeSecrets,
};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    load_from(|key| std::env::var(key).ok())
}

pub fn load_from<F>(lookup: F) -> Result<DotEnvyConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let backend_server = BackendServer {
        port: parse_or(&lookup, "SERVER_PORT", 4000)?,
        body_limit: parse_or(&lookup, "SERVER_BODY_LIMIT", 10)?,
        timeout: parse_or(&lookup, "SERVER_TIMEOUT", 30)?,
    };

    let database = Database {
        url: lookup("DATABASE_URL").context("DATABASE_URL is required")?,
    };

    let auth = AuthSecret {
        jwt_secret: lookup("JWT_SECRET").context("JWT_SECRET is required")?,
        token_ttl_hours: parse_or(&lookup, "JWT_TTL_HOURS", 168)?,
    };

    let stripe = match (lookup("STRIPE_SECRET_KEY"), lookup("STRIPE_WEBHOOK_SECRET")) {
        (Some(secret_key), Some(webhook_secret)) => Some(StripeSecrets {
            secret_key,
            webhook_secret,
        }),
        _ => None,
    };

    let app = AppSettings {
        base_url: lookup("APP_BASE_URL").unwrap_or_else(|| "http://localhost:5173".to_string()),
        cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN"),
    };

    let revocation_purge = RevocationPurge {
        interval_secs: parse_or(&lookup, "REVOCATION_PURGE_INTERVAL_SECS", 3600)?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        stripe,
        app,
        revocation_purge,
    })
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} is invalid: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost:5432/gym"),
        ("JWT_SECRET", "supersecretjwtsecretforunittesting123"),
    ];

    #[test]
    fn applies_defaults() {
        let config = load_from(lookup_in(&REQUIRED)).unwrap();

        assert_eq!(config.backend_server.port, 4000);
        assert_eq!(config.backend_server.body_limit, 10);
        assert_eq!(config.backend_server.timeout, 30);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.app.base_url, "http://localhost:5173");
        assert_eq!(config.revocation_purge.interval_secs, 3600);
        assert!(config.app.cors_allowed_origin.is_none());
        assert!(config.stripe.is_none());
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let err = load_from(lookup_in(&[("DATABASE_URL", "postgres://localhost/gym")]))
            .unwrap_err();

        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn malformed_port_is_an_error() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SERVER_PORT", "eighty"));

        let err = load_from(lookup_in(&vars)).unwrap_err();

        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn stripe_needs_both_secrets() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STRIPE_SECRET_KEY", "sk_test_123"));
        assert!(load_from(lookup_in(&vars)).unwrap().stripe.is_none());

        vars.push(("STRIPE_WEBHOOK_SECRET", "whsec_123"));
        let stripe = load_from(lookup_in(&vars)).unwrap().stripe.unwrap();
        assert_eq!(stripe.secret_key, "sk_test_123");
        assert_eq!(stripe.webhook_secret, "whsec_123");
    }
}
