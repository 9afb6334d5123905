// ============================================================================
// Transport HTTP
// ============================================================================
// Sépare "faire un GET" de "comprendre la réponse"
// - HttpTransport : implémentation réelle avec reqwest
// - Les tests fournissent leur propre Transport (compteur d'appels, pannes)
//
// CONCEPT RUST : Trait objects + async_trait
// - Les méthodes async dans un trait objet nécessitent #[async_trait]
// - Arc<dyn Transport> permet de substituer l'implémentation
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::config::ApiConfig;
use crate::error::FetchError;

/// User-Agent envoyé avec chaque requête
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) stockviz/0.1";

/// Exécute un GET et retourne le corps de la réponse
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` avec les paramètres `query`
    ///
    /// Échoue avec FetchError::Network sur erreur de connexion,
    /// timeout ou statut HTTP non-2xx
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError>;
}

/// Transport réel basé sur reqwest
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Crée le client HTTP à partir de la configuration
    pub fn new(config: &ApiConfig) -> Result<Self, FetchError> {
        Self::with_timeout(config.timeout)
    }

    /// Crée le client HTTP avec un timeout optionnel
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Network(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, FetchError> {
        debug!(url = %url, ?query, "Sending HTTP request");

        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, url = %url, "API returned error status");
            return Err(FetchError::Network(format!("HTTP {} for {}", status, url)));
        }

        Ok(response.text().await?)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_client_with_and_without_timeout() {
        assert!(HttpTransport::with_timeout(None).is_ok());
        assert!(HttpTransport::with_timeout(Some(Duration::from_secs(5))).is_ok());
        assert!(HttpTransport::new(&ApiConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_is_network_error() {
        // Port libre choisi par l'OS, refermé aussitôt : connexion refusée
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();

        let transport = HttpTransport::with_timeout(Some(Duration::from_secs(2))).unwrap();
        let err = transport
            .get(&format!("http://127.0.0.1:{}/api/quote/list", port), &[])
            .await
            .unwrap_err();

        assert!(err.is_network());
    }
}
