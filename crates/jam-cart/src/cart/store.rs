//! The authoritative in-process cart.

use crate::cart::{CartChange, CartEvent, CartState, ChangeNotifier, LineItem, Subscription};
use crate::error::CartError;
use crate::ids::{DiscountCode, ProductId, ZoneId};
use crate::summary::{CartSummary, PricingBackend, SummaryRequest};
use jam_storage::{JsonStore, KeyValueBackend, MemoryBackend, StorageError};
use std::future::Future;

/// Storage key used when none is configured.
pub const DEFAULT_STORAGE_KEY: &str = "jamjar:cart_items";

/// Shopping cart backed by a key-value store.
///
/// Every effective mutation bumps the generation, writes the full item
/// list to storage and then notifies observers. Calls that change nothing
/// do none of the three. Storage failures never fail a mutation: the
/// in-memory state stays authoritative and [`persistence_degraded`]
/// reports the problem until the next successful write.
///
/// [`persistence_degraded`]: CartStore::persistence_degraded
pub struct CartStore<B: KeyValueBackend = MemoryBackend> {
    state: CartState,
    storage: JsonStore<B>,
    key: String,
    notifier: ChangeNotifier,
    generation: u64,
    degraded: bool,
}

impl CartStore<MemoryBackend> {
    /// A store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::load(MemoryBackend::new())
    }
}

impl<B: KeyValueBackend> CartStore<B> {
    /// Load the cart persisted under [`DEFAULT_STORAGE_KEY`].
    pub fn load(backend: B) -> Self {
        Self::load_with_key(backend, DEFAULT_STORAGE_KEY)
    }

    /// Load the cart persisted under `key`.
    ///
    /// Missing or unreadable data yields an empty cart. If the backend
    /// itself fails, the store starts empty and degraded.
    pub fn load_with_key(backend: B, key: impl Into<String>) -> Self {
        let mut store = Self {
            state: CartState::new(),
            storage: JsonStore::new(backend),
            key: key.into(),
            notifier: ChangeNotifier::new(),
            generation: 0,
            degraded: false,
        };
        match store.read_persisted() {
            Ok(state) => store.state = state,
            Err(e) => {
                tracing::warn!(key = %store.key, error = %e, "failed to read cart; starting empty");
                store.degraded = true;
            }
        }
        tracing::debug!(
            key = %store.key,
            lines = store.state.unique_item_count(),
            "cart loaded"
        );
        store
    }

    /// Add `quantity` of a product (negative values decrement).
    ///
    /// Returns the resulting quantity, or `None` when the product is not in
    /// the cart afterwards.
    pub fn add_item(&mut self, product_id: &ProductId, quantity: i64) -> Option<i64> {
        let change = self.state.add(product_id, quantity);
        self.commit(change);
        self.quantity_if_present(product_id)
    }

    /// Set a product's absolute quantity; `<= 0` removes it.
    ///
    /// Returns the resulting quantity, or `None` when the product is not in
    /// the cart afterwards.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: i64) -> Option<i64> {
        let change = self.state.set(product_id, quantity);
        self.commit(change);
        self.quantity_if_present(product_id)
    }

    /// Remove a product. Returns whether it was in the cart.
    pub fn remove_item(&mut self, product_id: &ProductId) -> bool {
        let change = self.state.remove(product_id);
        let removed = change.is_some();
        self.commit(change);
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        let change = self.state.clear();
        self.commit(change);
    }

    /// Re-read storage, replacing the in-memory cart if it differs.
    ///
    /// Another writer sharing the key wins over local state. Returns whether
    /// anything changed. A failed read leaves the cart untouched, marks the
    /// store degraded and is reported as [`CartError::Persistence`].
    pub fn try_reload(&mut self) -> Result<bool, CartError> {
        let persisted = match self.read_persisted() {
            Ok(state) => state,
            Err(e) => {
                self.degraded = true;
                return Err(e.into());
            }
        };
        if persisted == self.state {
            return Ok(false);
        }
        self.state = persisted;
        self.generation += 1;
        self.notify(CartChange::Reloaded);
        Ok(true)
    }

    /// [`try_reload`](Self::try_reload) that logs read failures and keeps
    /// the in-memory cart.
    pub fn reload(&mut self) -> bool {
        self.try_reload().unwrap_or_else(|e| {
            tracing::warn!(key = %self.key, error = %e, "failed to reload cart; keeping in-memory state");
            false
        })
    }

    /// Snapshot of the line items in insertion order.
    pub fn items(&self) -> Vec<LineItem> {
        self.state.items().to_vec()
    }

    /// Sum of quantities.
    pub fn item_count(&self) -> i64 {
        self.state.item_count()
    }

    /// Number of distinct products.
    pub fn unique_item_count(&self) -> usize {
        self.state.unique_item_count()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Quantity of a product, zero when absent.
    pub fn quantity_of(&self, product_id: &ProductId) -> i64 {
        self.state.quantity_of(product_id)
    }

    /// Monotonic counter of effective mutations since load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True after a failed read or write, until the next successful write.
    pub fn persistence_degraded(&self) -> bool {
        self.degraded
    }

    /// Storage key this cart is persisted under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Borrow the underlying store.
    pub fn storage(&self) -> &JsonStore<B> {
        &self.storage
    }

    /// Register an observer for [`CartEvent`]s.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.notifier.subscribe(observer)
    }

    /// Build a summary request from the current contents.
    pub fn summary_request(
        &self,
        zone_id: Option<&ZoneId>,
        discount_code: Option<&DiscountCode>,
    ) -> SummaryRequest {
        SummaryRequest::new(self.items(), zone_id, discount_code)
    }

    /// Price the current contents through `pricing`.
    ///
    /// The items are snapshotted before this returns, so the returned
    /// future does not borrow the store and the cart may keep changing
    /// while the request is in flight.
    pub fn compute_summary<'p, P>(
        &self,
        pricing: &'p P,
        zone_id: Option<&ZoneId>,
        discount_code: Option<&DiscountCode>,
    ) -> impl Future<Output = Result<CartSummary, CartError>> + 'p
    where
        P: PricingBackend + ?Sized,
    {
        let request = self.summary_request(zone_id, discount_code);
        async move {
            tracing::debug!(lines = request.items.len(), "requesting cart summary");
            pricing.compute_summary(&request).await
        }
    }

    fn commit(&mut self, change: Option<CartChange>) {
        let Some(change) = change else {
            return;
        };
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            items = self.state.item_count(),
            change = ?change,
            "cart changed"
        );
        self.persist();
        self.notify(change);
    }

    fn notify(&self, change: CartChange) {
        let event = CartEvent {
            change,
            item_count: self.state.item_count(),
            unique_items: self.state.unique_item_count(),
            generation: self.generation,
        };
        self.notifier.emit(&event);
    }

    fn persist(&mut self) {
        let result = if self.state.is_empty() {
            self.storage.delete(&self.key)
        } else {
            self.storage.set(&self.key, self.state.items())
        };

        match result {
            Ok(()) => {
                if self.degraded {
                    tracing::info!(key = %self.key, "cart persistence recovered");
                }
                self.degraded = false;
            }
            Err(e) => {
                tracing::warn!(
                    key = %self.key,
                    error = %e,
                    "failed to persist cart; keeping in-memory state"
                );
                self.degraded = true;
            }
        }
    }

    /// Decode the persisted cart. Corrupt data reads as an empty cart;
    /// only backend failures are errors.
    fn read_persisted(&self) -> Result<CartState, StorageError> {
        let entries = match self.storage.get::<Vec<serde_json::Value>>(&self.key) {
            Ok(Some(entries)) => entries,
            Ok(None) => return Ok(CartState::new()),
            Err(StorageError::SerializeError(e)) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable cart data");
                return Ok(CartState::new());
            }
            Err(e) => return Err(e),
        };

        let total = entries.len();
        let items: Vec<LineItem> = entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        let malformed = total - items.len();

        let (state, report) = CartState::from_persisted(items);
        if malformed > 0 || !report.is_clean() {
            tracing::warn!(
                key = %self.key,
                malformed,
                merged = report.merged,
                dropped = report.dropped,
                "normalized persisted cart"
            );
        }
        Ok(state)
    }

    fn quantity_if_present(&self, product_id: &ProductId) -> Option<i64> {
        match self.state.quantity_of(product_id) {
            0 => None,
            q => Some(q),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};
    use crate::summary::StockReport;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn collect_events<B: KeyValueBackend>(
        store: &CartStore<B>,
    ) -> (Arc<Mutex<Vec<CartEvent>>>, Subscription) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = store.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        (events, sub)
    }

    #[test]
    fn test_add_persists_and_notifies() {
        let backend = MemoryBackend::new();
        let mut store = CartStore::load(backend.clone());
        let (events, _sub) = collect_events(&store);

        assert_eq!(store.add_item(&pid("A"), 2), Some(2));
        assert_eq!(store.add_item(&pid("A"), 3), Some(5));

        assert_eq!(store.items(), vec![LineItem::new("A", 5)]);
        assert_eq!(store.item_count(), 5);
        assert_eq!(store.generation(), 2);

        let raw = backend.get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let persisted: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(
            persisted,
            serde_json::json!([{"producto_id": "A", "cantidad": 5}])
        );

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].item_count, 5);
        assert_eq!(events[1].generation, 2);
    }

    #[test]
    fn test_set_zero_removes_without_error() {
        let mut store = CartStore::in_memory();
        store.add_item(&pid("A"), 2);
        store.add_item(&pid("B"), 1);

        assert_eq!(store.set_quantity(&pid("A"), 0), None);
        assert_eq!(store.items(), vec![LineItem::new("B", 1)]);
        assert_eq!(store.item_count(), 1);
    }

    #[test]
    fn test_noops_emit_nothing() {
        let mut store = CartStore::in_memory();
        let (events, _sub) = collect_events(&store);

        assert!(!store.remove_item(&pid("missing")));
        store.add_item(&pid("A"), 0);
        store.set_quantity(&pid("A"), -1);
        store.clear();

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_round_trip_through_storage() {
        let backend = MemoryBackend::new();
        let mut store = CartStore::load(backend.clone());
        store.add_item(&pid("fresa"), 2);
        store.add_item(&pid("mora"), 1);
        store.set_quantity(&pid("fresa"), 4);

        let reopened = CartStore::load(backend);
        assert_eq!(reopened.items(), store.items());
    }

    #[test]
    fn test_clear_empties_and_removes_key() {
        let backend = MemoryBackend::new();
        let mut store = CartStore::load(backend.clone());
        store.add_item(&pid("A"), 1);
        store.add_item(&pid("B"), 2);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.item_count(), 0);
        assert!(!backend.exists(DEFAULT_STORAGE_KEY).unwrap());
        assert!(CartStore::load(backend).is_empty());
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let backend = MemoryBackend::new().with_quota(64);
        let mut store = CartStore::load(backend.clone());
        let (events, _sub) = collect_events(&store);

        store.add_item(&pid("A"), 1);
        assert!(!store.persistence_degraded());

        store.add_item(&pid("a-much-longer-product-identifier"), 1);
        assert!(store.persistence_degraded());
        assert_eq!(store.unique_item_count(), 2);
        assert_eq!(events.lock().unwrap().len(), 2);

        // The stored copy still holds the last successful write.
        let reopened = CartStore::load(backend);
        assert_eq!(reopened.items(), vec![LineItem::new("A", 1)]);

        store.remove_item(&pid("a-much-longer-product-identifier"));
        assert!(!store.persistence_degraded());
    }

    #[test]
    fn test_load_normalizes_persisted_data() {
        let backend = MemoryBackend::new();
        backend
            .set(
                DEFAULT_STORAGE_KEY,
                br#"[{"producto_id":"A","cantidad":2},{"producto_id":"A","cantidad":1},
                     {"producto_id":"B","cantidad":0},{"bogus":true},
                     {"productId":"C","quantity":3}]"#,
            )
            .unwrap();

        let store = CartStore::load(backend);
        assert_eq!(
            store.items(),
            vec![LineItem::new("A", 3), LineItem::new("C", 3)]
        );
    }

    #[test]
    fn test_load_corrupt_data_starts_empty() {
        let backend = MemoryBackend::new();
        backend.set(DEFAULT_STORAGE_KEY, b"{not json").unwrap();
        let store = CartStore::load(backend.clone());
        assert!(store.is_empty());

        backend.set_disabled(true);
        let store = CartStore::load(backend);
        assert!(store.is_empty());
        assert!(store.persistence_degraded());
    }

    #[test]
    fn test_reload_read_failure_keeps_memory_state() {
        let backend = MemoryBackend::new();
        let mut store = CartStore::load(backend.clone());
        store.add_item(&pid("jam-1"), 2);
        store.add_item(&pid("jam-2"), 1);
        let (events, _sub) = collect_events(&store);
        let generation = store.generation();

        backend.set_disabled(true);
        assert!(!store.reload());
        assert!(matches!(
            store.try_reload(),
            Err(CartError::Persistence(StorageError::Unavailable(_)))
        ));

        assert_eq!(
            store.items(),
            vec![LineItem::new("jam-1", 2), LineItem::new("jam-2", 1)]
        );
        assert_eq!(store.generation(), generation);
        assert!(store.persistence_degraded());
        assert!(events.lock().unwrap().is_empty());

        backend.set_disabled(false);
        store.add_item(&pid("jam-1"), 1);
        assert!(!store.persistence_degraded());
    }

    #[test]
    fn test_reload_picks_up_other_writer() {
        let backend = MemoryBackend::new();
        let mut ours = CartStore::load(backend.clone());
        let mut theirs = CartStore::load(backend);
        let (events, _sub) = collect_events(&ours);

        ours.add_item(&pid("A"), 1);
        theirs.add_item(&pid("B"), 2);

        assert!(ours.reload());
        assert_eq!(ours.items(), vec![LineItem::new("B", 2)]);
        assert!(!ours.reload());

        let events = events.lock().unwrap();
        assert_eq!(events.last().unwrap().change, CartChange::Reloaded);
    }

    #[test]
    fn test_custom_storage_key() {
        let backend = MemoryBackend::new();
        let mut store = CartStore::load_with_key(backend.clone(), "shop-2:cart");
        store.add_item(&pid("A"), 1);
        assert_eq!(store.storage_key(), "shop-2:cart");
        assert!(backend.exists("shop-2:cart").unwrap());
        assert!(!backend.exists(DEFAULT_STORAGE_KEY).unwrap());
    }

    struct FailingPricing;

    #[async_trait]
    impl PricingBackend for FailingPricing {
        async fn compute_summary(&self, _: &SummaryRequest) -> Result<CartSummary, CartError> {
            Err(CartError::PricingBackend(jam_data::FetchError::Timeout))
        }

        async fn validate_stock(&self, _: &[LineItem]) -> Result<StockReport, CartError> {
            Err(CartError::PricingBackend(jam_data::FetchError::Timeout))
        }
    }

    struct FlatPricing;

    #[async_trait]
    impl PricingBackend for FlatPricing {
        async fn compute_summary(&self, req: &SummaryRequest) -> Result<CartSummary, CartError> {
            let count: i64 = req.items.iter().map(|i| i.quantity).sum();
            let usd = |c| Money::new(c, Currency::USD);
            Ok(CartSummary {
                subtotal: usd(1000 * count),
                shipping_cost: usd(0),
                discount_amount: usd(0),
                final_total: usd(1000 * count),
                item_count: Some(count),
                zone: None,
                discount: None,
                lines: Vec::new(),
            })
        }

        async fn validate_stock(&self, _: &[LineItem]) -> Result<StockReport, CartError> {
            Ok(StockReport {
                all_available: true,
                out_of_stock: Vec::new(),
                message: None,
            })
        }
    }

    #[tokio::test]
    async fn test_compute_summary_failure_leaves_cart_untouched() {
        let mut store = CartStore::in_memory();
        store.add_item(&pid("A"), 1);
        let before = store.generation();

        let err = store
            .compute_summary(&FailingPricing, None, None)
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(store.items(), vec![LineItem::new("A", 1)]);
        assert_eq!(store.generation(), before);
    }

    #[tokio::test]
    async fn test_compute_summary_uses_snapshot() {
        let mut store = CartStore::in_memory();
        store.add_item(&pid("A"), 2);

        let pending = store.compute_summary(&FlatPricing, None, None);
        store.add_item(&pid("B"), 5);
        let summary = pending.await.unwrap();

        assert_eq!(summary.item_count, Some(2));
        assert_eq!(store.item_count(), 7);
    }
}
