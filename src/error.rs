// ============================================================================
// Erreurs des fetchers
// ============================================================================
// Deux familles d'erreurs seulement :
// - Network : la requête HTTP a échoué (connexion, timeout, statut non-2xx)
// - Format  : la réponse ne ressemble pas au JSON attendu
//
// CONCEPT RUST : thiserror
// - #[derive(Error)] implémente std::error::Error pour nous
// - #[error("...")] génère l'implémentation de Display
// ============================================================================

use thiserror::Error;

/// Erreur retournée par les fetchers de l'API brapi
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Échec du transport HTTP
    #[error("network error: {0}")]
    Network(String),

    /// Réponse JSON inattendue
    #[error("format error: {0}")]
    Format(String),
}

impl FetchError {
    /// Vrai pour une erreur réseau (seules celles-ci sont rejouées)
    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(value: reqwest::Error) -> Self {
        FetchError::Network(value.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(value: serde_json::Error) -> Self {
        FetchError::Format(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = FetchError::Format("missing results".to_string());
        assert_eq!(err.to_string(), "format error: missing results");
        assert!(!err.is_network());
        assert!(FetchError::Network("timeout".to_string()).is_network());
    }

    #[test]
    fn test_from_serde_error_is_format() {
        let err: FetchError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, FetchError::Format(_)));
    }
}
