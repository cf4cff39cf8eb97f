use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub scope: ScopeConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub derive_branch_from_course: bool,
    /// Accept `x-school-id`-style aliases besides the `x-managed-*` headers
    pub accept_legacy_headers: bool,
    pub audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Scope overrides
        if let Ok(v) = env::var("SCOPE_DERIVE_BRANCH_FROM_COURSE") {
            self.scope.derive_branch_from_course =
                v.parse().unwrap_or(self.scope.derive_branch_from_course);
        }
        if let Ok(v) = env::var("SCOPE_ACCEPT_LEGACY_HEADERS") {
            self.scope.accept_legacy_headers =
                v.parse().unwrap_or(self.scope.accept_legacy_headers);
        }
        if let Ok(v) = env::var("SCOPE_AUDIT_LOGGING") {
            self.scope.audit_logging = v.parse().unwrap_or(self.scope.audit_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging =
                v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // Server overrides
        if let Some(port) = env::var("SCHOOL_SCOPE_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            scope: ScopeConfig {
                derive_branch_from_course: true,
                accept_legacy_headers: true,
                audit_logging: false,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            server: ServerConfig { port: 3000 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            scope: ScopeConfig {
                derive_branch_from_course: true,
                accept_legacy_headers: true,
                audit_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            server: ServerConfig { port: 3000 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            scope: ScopeConfig {
                derive_branch_from_course: true,
                accept_legacy_headers: false,
                audit_logging: true,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            server: ServerConfig { port: 8080 },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.scope.derive_branch_from_course);
        assert!(config.scope.accept_legacy_headers);
        assert!(config.database.enable_query_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.scope.accept_legacy_headers);
        assert!(config.scope.audit_logging);
        assert_eq!(config.database.max_connections, 50);
    }
}
