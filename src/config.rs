// ============================================================================
// Configuration
// ============================================================================
// Tous les réglages passent par des variables d'environnement (STOCKVIZ_*)
// Un fichier .env est chargé s'il existe (dotenvy)
//
// Valeurs par défaut = comportement d'origine :
// - https://brapi.ga, pas de timeout, pas de retry, cache sans expiration
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// URL de base de l'API brapi
pub const DEFAULT_BASE_URL: &str = "https://brapi.ga";

/// Délai par défaut entre deux tentatives
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Réglages du client API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// URL de base, sans slash final (ex: "https://brapi.ga")
    pub base_url: String,

    /// Timeout par requête (None = attend indéfiniment)
    pub timeout: Option<Duration>,

    /// Nombre de tentatives supplémentaires sur erreur réseau
    pub max_retries: u32,

    /// Attente entre deux tentatives
    pub retry_backoff: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            max_retries: 0,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl ApiConfig {
    /// URL de l'endpoint liste
    pub fn list_url(&self) -> String {
        format!("{}/api/quote/list", self.base_url)
    }

    /// URL de l'endpoint détail pour un ticker
    pub fn quote_url(&self, ticker: &str) -> String {
        format!("{}/api/quote/{}", self.base_url, ticker)
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub api: ApiConfig,

    /// Durée de vie des entrées de cache (None = toute la vie du process)
    pub cache_ttl: Option<Duration>,

    /// Répertoire des logs forcé (sinon dossier de données utilisateur)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Lit la configuration depuis l'environnement (et .env si présent)
    pub fn from_env() -> Result<Self> {
        // Un .env absent n'est pas une erreur
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Construit la configuration à partir d'une fonction de lookup
    ///
    /// CONCEPT RUST : Closures génériques
    /// - F: Fn(&str) -> Option<String> : n'importe quelle source de clés
    /// - from_env() passe std::env::var, les tests passent une HashMap
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("STOCKVIZ_BASE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if url.is_empty() {
                anyhow::bail!("STOCKVIZ_BASE_URL ne peut pas être vide");
            }
            config.api.base_url = url;
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "STOCKVIZ_TIMEOUT_SECS")? {
            config.api.timeout = Some(Duration::from_secs(secs));
        }

        if let Some(retries) = parse_var::<u32, _>(&lookup, "STOCKVIZ_MAX_RETRIES")? {
            config.api.max_retries = retries;
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, "STOCKVIZ_RETRY_BACKOFF_MS")? {
            config.api.retry_backoff = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_var::<u64, _>(&lookup, "STOCKVIZ_CACHE_TTL_SECS")? {
            config.cache_ttl = Some(Duration::from_secs(secs));
        }

        config.log_dir = lookup("STOCKVIZ_LOG_DIR").map(PathBuf::from);

        Ok(config)
    }

    /// Répertoire des logs effectif
    ///
    /// - Linux/WSL : ~/.local/share/stockviz/logs
    /// - macOS : ~/Library/Application Support/stockviz/logs
    /// - Sinon : ./logs
    pub fn log_dir(&self) -> PathBuf {
        if let Some(dir) = &self.log_dir {
            return dir.clone();
        }

        dirs::data_local_dir()
            .map(|dir| dir.join("stockviz").join("logs"))
            .unwrap_or_else(|| PathBuf::from("./logs"))
    }
}

/// Parse une variable optionnelle, erreur si présente mais invalide
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => {
            let value = raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("Valeur invalide pour {} : {:?}", key, raw))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_source_behaviour() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.api.base_url, "https://brapi.ga");
        assert_eq!(config.api.timeout, None);
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.cache_ttl, None);
        assert_eq!(config.api.list_url(), "https://brapi.ga/api/quote/list");
        assert_eq!(config.api.quote_url("PETR4"), "https://brapi.ga/api/quote/PETR4");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("STOCKVIZ_BASE_URL", "http://localhost:8080/"),
            ("STOCKVIZ_TIMEOUT_SECS", "5"),
            ("STOCKVIZ_MAX_RETRIES", "2"),
            ("STOCKVIZ_RETRY_BACKOFF_MS", "10"),
            ("STOCKVIZ_CACHE_TTL_SECS", "3600"),
            ("STOCKVIZ_LOG_DIR", "/tmp/stockviz"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.api.max_retries, 2);
        assert_eq!(config.api.retry_backoff, Duration::from_millis(10));
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/stockviz"));
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("STOCKVIZ_MAX_RETRIES", "many")]));
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("STOCKVIZ_MAX_RETRIES"));
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("STOCKVIZ_BASE_URL", "  ")]));
        assert!(result.is_err());
    }
}
