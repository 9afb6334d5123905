// ============================================================================
// Stock Viz - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // API brapi + fetchers mémoïsés
pub mod app;       // État de l'application
pub mod cache;     // Cache TTL
pub mod config;    // Configuration (variables d'environnement)
pub mod error;     // Erreurs de récupération
pub mod models;    // Structures de données
pub mod ui;        // Interface utilisateur
