// ============================================================================
// Cache de mémoïsation avec TTL
// ============================================================================
// Cache clé -> Arc<V> partagé par tout le process
//
// POLITIQUE DE CONCURRENCE : single-flight par clé
// - Chaque clé possède son propre slot protégé par un Mutex async
// - Le premier appelant remplit le slot, les appels concurrents sur la
//   même clé attendent puis réutilisent la valeur
// - Des clés différentes se remplissent en parallèle
// - Une erreur n'est jamais mise en cache : l'appel suivant refait le fetch
//
// CONCEPTS RUST :
// 1. tokio::sync::Mutex : verrou qu'on peut garder à travers un .await
// 2. Arc<V> : la même valeur est partagée (identité observable avec ptr_eq)
// 3. Generics avec bornes : K: Eq + Hash + Clone
// ============================================================================

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Une valeur en cache avec sa date d'insertion
struct Entry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

/// Slot d'une clé : vide tant que la valeur n'a pas été calculée
type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

/// Cache mémoïsant avec durée de vie optionnelle
pub struct TtlCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    ttl: Option<Duration>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Crée un cache vide
    ///
    /// * `ttl` - None : les entrées vivent aussi longtemps que le process
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Durée de vie configurée
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        match self.ttl {
            Some(ttl) => entry.inserted_at.elapsed() < ttl,
            None => true,
        }
    }

    /// Récupère (ou crée) le slot d'une clé
    ///
    /// Le verrou de la map n'est tenu que le temps du lookup
    async fn slot(&self, key: &K) -> Slot<V> {
        let mut slots = self.slots.lock().await;
        slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// Retourne la valeur en cache, ou la calcule avec `fetch`
    ///
    /// CONCEPT RUST : FnOnce + Future
    /// - `fetch` n'est appelé que si la clé est absente ou expirée
    /// - Le verrou du slot est gardé pendant le fetch : un seul fetch par clé
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, fetch: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key).await;
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if self.is_fresh(entry) {
                return Ok(entry.value.clone());
            }
        }

        let value = match fetch().await {
            Ok(value) => Arc::new(value),
            Err(e) => {
                self.release_failed_slot(&key, &slot, guard.is_none()).await;
                return Err(e);
            }
        };
        *guard = Some(Entry {
            value: value.clone(),
            inserted_at: Instant::now(),
        });

        Ok(value)
    }

    /// Retire de la map le slot d'un fetch échoué
    ///
    /// Seulement si le slot est vide et que personne d'autre ne l'attend
    /// (référencé par la map et par l'appelant uniquement). Les appelants
    /// clonent le slot sous le verrou de la map : le compte est stable ici.
    async fn release_failed_slot(&self, key: &K, slot: &Slot<V>, is_empty: bool) {
        let mut slots = self.slots.lock().await;
        let is_ours = slots.get(key).is_some_and(|s| Arc::ptr_eq(s, slot));
        if is_empty && is_ours && Arc::strong_count(slot) == 2 {
            slots.remove(key);
        }
    }

    /// Valeur fraîche en cache, sans déclencher de fetch
    pub async fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = {
            let slots = self.slots.lock().await;
            slots.get(key).cloned()
        }?;

        let guard = slot.lock().await;
        guard
            .as_ref()
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.value.clone())
    }

    /// Oublie une clé : le prochain appel refera le fetch
    pub async fn invalidate(&self, key: &K) {
        self.slots.lock().await.remove(key);
    }

    /// Vide tout le cache
    pub async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    /// Nombre de clés connues (y compris en cours de calcul)
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }

    /// Vrai si aucune clé n'est connue
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_value_is_computed_once() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        let calls = &AtomicUsize::new(0);

        let first = cache
            .get_or_try_insert_with("PETR4".to_string(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(42)
            })
            .await
            .unwrap();

        let second = cache
            .get_or_try_insert_with("PETR4".to_string(), move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(7)
            })
            .await
            .unwrap();

        assert_eq!(*first, 42);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache: TtlCache<String, String> = TtlCache::new(None);

        let a = cache
            .get_or_try_insert_with("PETR4".to_string(), || async { Ok::<_, ()>("a".to_string()) })
            .await
            .unwrap();
        let b = cache
            .get_or_try_insert_with("VALE3".to_string(), || async { Ok::<_, ()>("b".to_string()) })
            .await
            .unwrap();

        assert_eq!(a.as_str(), "a");
        assert_eq!(b.as_str(), "b");
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: TtlCache<(), u32> = TtlCache::new(None);

        let failed = cache
            .get_or_try_insert_with((), || async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(failed.unwrap_err(), "boom");
        assert!(cache.get(&()).await.is_none());

        let ok = cache
            .get_or_try_insert_with((), || async { Ok::<_, &str>(1) })
            .await
            .unwrap();
        assert_eq!(*ok, 1);
    }

    #[tokio::test]
    async fn test_failed_keys_do_not_accumulate() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);

        for ticker in ["XXXX3", "YYYY4", "XXXX3"] {
            let failed = cache
                .get_or_try_insert_with(ticker.to_string(), || async { Err::<u32, _>("not found") })
                .await;
            assert!(failed.is_err());
        }

        assert_eq!(cache.len().await, 0);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_waiter_refills_slot_after_a_failure() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);

        let (first, second) = tokio::join!(
            cache.get_or_try_insert_with("PETR4".to_string(), || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<u32, _>("reset")
            }),
            cache.get_or_try_insert_with("PETR4".to_string(), || async { Ok::<_, &str>(3) }),
        );

        assert_eq!(first.unwrap_err(), "reset");
        assert_eq!(*second.unwrap(), 3);
        assert_eq!(cache.get(&"PETR4".to_string()).await.as_deref(), Some(&3));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_refetches() {
        let cache: TtlCache<(), u32> = TtlCache::new(Some(Duration::ZERO));
        let calls = &AtomicUsize::new(0);

        for _ in 0..3 {
            cache
                .get_or_try_insert_with((), move || async move {
                    Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.get(&()).await.is_none());
    }

    #[tokio::test]
    async fn test_long_ttl_keeps_value() {
        let cache: TtlCache<(), u32> = TtlCache::new(Some(Duration::from_secs(3600)));
        cache
            .get_or_try_insert_with((), || async { Ok::<_, ()>(5) })
            .await
            .unwrap();

        assert_eq!(cache.get(&()).await.as_deref(), Some(&5));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        for key in ["A", "B"] {
            cache
                .get_or_try_insert_with(key.to_string(), || async { Ok::<_, ()>(1) })
                .await
                .unwrap();
        }

        cache.invalidate(&"A".to_string()).await;
        assert!(cache.get(&"A".to_string()).await.is_none());
        assert!(cache.get(&"B".to_string()).await.is_some());

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_population_is_single_flight() {
        let cache: TtlCache<String, u32> = TtlCache::new(None);
        let calls = &AtomicUsize::new(0);

        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, ()>(99)
        };

        let (a, b) = tokio::join!(
            cache.get_or_try_insert_with("PETR4".to_string(), fetch),
            cache.get_or_try_insert_with("PETR4".to_string(), fetch),
        );

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
