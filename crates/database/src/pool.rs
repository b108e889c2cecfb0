use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use std::fs::File;
use std::io::BufReader;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Connection pool type alias
pub type DbPool = Pool;

/// Build the deadpool configuration from application settings
fn pool_config(config: &config::DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    cfg.host = Some(config.host.clone());
    cfg.port = Some(config.port);
    cfg.dbname = Some(config.database.clone());
    cfg.user = Some(config.username.clone());
    cfg.password = Some(config.password.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    cfg.pool = Some(PoolConfig::new(config.max_connections as usize));
    cfg
}

/// Create a pool and check out one connection so an unreachable database fails at startup
pub async fn create_pool(config: &config::DatabaseConfig) -> anyhow::Result<DbPool> {
    let cfg = pool_config(config);

    let pool = if config.tls_enabled {
        create_pool_with_rustls(cfg, config.tls_ca_cert_path.as_deref())?
    } else {
        info!("Database TLS disabled");
        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| anyhow::anyhow!("Failed to create pool: {e}"))?
    };

    let client = pool
        .get()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to the database: {e}"))?;
    drop(client);

    info!(
        "Database pool ready: {}:{}/{} (max {} connections)",
        config.host, config.port, config.database, config.max_connections
    );

    Ok(pool)
}

/// Create pool using rustls with either a custom CA certificate or the platform verifier
pub fn create_pool_with_rustls(cfg: Config, cert_path: Option<&str>) -> anyhow::Result<Pool> {
    use tokio_postgres_rustls::MakeRustlsConnect;

    // Install the default crypto provider (ring) if not already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    let client_config = match cert_path {
        Some(cert_path) => {
            info!("Using rustls with custom CA certificate from: {}", cert_path);
            let root_store = load_root_store(cert_path)?;
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth()
        }
        None => {
            info!("Using rustls with platform verifier (OS certificate store)");

            use rustls_platform_verifier::ConfigVerifierExt;
            rustls::ClientConfig::with_platform_verifier()
                .map_err(|e| anyhow::anyhow!("Failed to create platform verifier: {}", e))?
        }
    };

    let tls = MakeRustlsConnect::new(client_config);

    cfg.create_pool(Some(Runtime::Tokio1), tls)
        .map_err(|e| anyhow::anyhow!("Failed to create TLS pool: {}", e))
}

/// Read every PEM certificate in `cert_path` into a root store
fn load_root_store(cert_path: &str) -> anyhow::Result<rustls::RootCertStore> {
    debug!("Loading CA certificate from: {}", cert_path);

    let cert_file = File::open(cert_path)
        .map_err(|e| anyhow::anyhow!("Failed to open certificate file {}: {}", cert_path, e))?;
    let mut reader = BufReader::new(cert_file);

    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Failed to parse certificate: {}", e))?;

    if certs.is_empty() {
        return Err(anyhow::anyhow!("No certificates found in {}", cert_path));
    }

    let mut root_store = rustls::RootCertStore::empty();
    for cert in certs {
        root_store
            .add(cert)
            .map_err(|e| anyhow::anyhow!("Failed to add certificate to root store: {}", e))?;
    }

    info!("Loaded {} CA certificate(s) from {}", root_store.len(), cert_path);
    Ok(root_store)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> config::DatabaseConfig {
        config::DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            database: "subscriptions".to_string(),
            username: "postgres".to_string(),
            password: "postgres".to_string(),
            max_connections: 7,
            tls_enabled: false,
            tls_ca_cert_path: None,
        }
    }

    #[test]
    fn test_pool_config_copies_connection_settings() {
        let cfg = pool_config(&test_config());

        assert_eq!(cfg.host.as_deref(), Some("localhost"));
        assert_eq!(cfg.port, Some(5432));
        assert_eq!(cfg.dbname.as_deref(), Some("subscriptions"));
        assert_eq!(cfg.user.as_deref(), Some("postgres"));
        assert_eq!(cfg.pool.map(|p| p.max_size), Some(7));
    }

    #[test]
    fn test_missing_ca_certificate_is_an_error() {
        let result = load_root_store("/nonexistent/ca.pem");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_ca_file_is_an_error() {
        let path = std::env::temp_dir().join("subscriptions_empty_ca.pem");
        std::fs::write(&path, "").unwrap();

        let result = load_root_store(path.to_str().unwrap());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No certificates found"));

        std::fs::remove_file(&path).ok();
    }
}
