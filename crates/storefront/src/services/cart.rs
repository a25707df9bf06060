//! Cart state with publish/subscribe change notification.
//!
//! [`CartStore`] owns an immutable [`CartState`] snapshot. Every mutation
//! builds a new snapshot, swaps it in, and notifies subscribers with it; a
//! snapshot already handed out through [`CartStore::get`] never changes.
//!
//! The storefront keeps the snapshot in the visitor session and rebuilds a
//! store per request with [`CartStore::from_state`].

use std::sync::{Arc, Mutex, PoisonError, Weak};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use rwaya_core::{ProductId, Quantity, QuantityError};

/// Highest unit price a cart line may carry.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Check a unit price is positive and at most [`MAX_UNIT_PRICE`].
///
/// # Errors
///
/// Returns [`CartError::InvalidPrice`] otherwise.
pub fn check_price(price: Decimal) -> Result<Decimal, CartError> {
    if price > Decimal::ZERO && price <= MAX_UNIT_PRICE {
        Ok(price)
    } else {
        Err(CartError::InvalidPrice(price))
    }
}

/// A line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    pub quantity: Quantity,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    /// Price times quantity, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity.get()))
    }
}

/// The cart contents: ordered, unique by item id.
///
/// Totals are always derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(CartItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Rebuild a state from stored lines, dropping duplicate ids after the
    /// first occurrence and lines with an out-of-range price.
    fn from_items(items: Vec<CartItem>) -> Self {
        let mut state = Self::default();
        for item in items {
            if check_price(item.price).is_err() {
                warn!(
                    product_id = %item.id,
                    price = %item.price,
                    "Dropping cart line with invalid price"
                );
                continue;
            }
            if state.get(&item.id).is_none() {
                state.items.push(item);
            }
        }
        state
    }
}

/// Errors from cart mutations. State is unchanged when one is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Requested quantity is below 1 or out of range.
    #[error("invalid quantity: {0}")]
    Validation(#[from] QuantityError),

    /// Unit price is not positive or above [`MAX_UNIT_PRICE`].
    #[error("invalid price: {0}")]
    InvalidPrice(Decimal),

    /// No line with this id.
    #[error("item {0} is not in the cart")]
    NotInCart(ProductId),
}

type Listener = Arc<dyn Fn(&CartState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Handle returned by [`CartStore::subscribe`].
///
/// The listener stays registered until this handle is dropped or
/// [`Subscription::unsubscribe`] is called.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    /// Remove the listener.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            let mut listeners = listeners.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Observable cart.
///
/// Mutations are serialized: listeners see every snapshot, in the order the
/// changes were made, even with several writers. Listeners run inside that
/// ordering and must not mutate the store themselves.
#[derive(Default)]
pub struct CartStore {
    state: Mutex<Arc<CartState>>,
    listeners: Arc<Mutex<Listeners>>,
    writer: Mutex<()>,
}

impl CartStore {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a persisted snapshot.
    #[must_use]
    pub fn from_state(state: CartState) -> Self {
        Self {
            state: Mutex::new(Arc::new(CartState::from_items(state.items))),
            ..Self::default()
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn get(&self) -> Arc<CartState> {
        Arc::clone(&self.state.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Register a listener called with the new snapshot after every change.
    ///
    /// The listener may read the store but must not mutate it.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&CartState) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Add a line. Does nothing if an item with the same id is already in
    /// the cart; the existing quantity is kept. Items failing
    /// [`check_price`] are never added.
    ///
    /// Returns whether the item was added.
    pub fn add_item(&self, item: CartItem) -> bool {
        self.commit(|state| {
            check_price(item.price)?;
            if state.get(&item.id).is_some() {
                return Ok(false);
            }
            state.items.push(item);
            Ok(true)
        })
        .unwrap_or(false)
    }

    /// Set the quantity of a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Validation`] if `quantity` is below 1 (or does
    /// not fit a `u32`), and [`CartError::NotInCart`] for an unknown id.
    pub fn update_quantity(&self, id: &ProductId, quantity: i64) -> Result<(), CartError> {
        let quantity = Quantity::new(quantity)?;
        self.commit(|state| {
            let item = state
                .items
                .iter_mut()
                .find(|item| &item.id == id)
                .ok_or_else(|| CartError::NotInCart(id.clone()))?;

            if item.quantity == quantity {
                return Ok(false);
            }
            item.quantity = quantity;
            Ok(true)
        })
        .map(|_| ())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove_item(&self, id: &ProductId) -> bool {
        self.commit(|state| {
            let before = state.items.len();
            state.items.retain(|item| &item.id != id);
            Ok(state.items.len() != before)
        })
        .unwrap_or(false)
    }

    /// Empty the cart. Returns whether it had anything in it.
    pub fn remove_all(&self) -> bool {
        self.commit(|state| {
            if state.items.is_empty() {
                return Ok(false);
            }
            state.items.clear();
            Ok(true)
        })
        .unwrap_or(false)
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.get().total_quantity()
    }

    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.get().total_price()
    }

    /// Apply `change` to a copy of the current state. If it reports a
    /// change, swap the copy in and notify listeners.
    ///
    /// The writer lock is held until every listener has run, so snapshots
    /// are delivered in commit order. The state lock is released before
    /// notifying, so listeners can call [`Self::get`].
    fn commit<F>(&self, change: F) -> Result<bool, CartError>
    where
        F: FnOnce(&mut CartState) -> Result<bool, CartError>,
    {
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = {
            let mut current = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let mut next = CartState::clone(&current);
            if !change(&mut next)? {
                return Ok(false);
            }
            let next = Arc::new(next);
            *current = Arc::clone(&next);
            next
        };

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&snapshot);
        }

        Ok(true)
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("state", &self.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    pub(crate) fn item(id: &str, price: i64, quantity: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(price, 0),
            quantity: Quantity::new(quantity).unwrap(),
            image_url: None,
        }
    }

    fn counting(store: &CartStore) -> (Arc<AtomicUsize>, Subscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let subscription = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (calls, subscription)
    }

    #[test]
    fn test_totals_are_derived() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 2));
        store.add_item(item("b", 50, 1));

        assert_eq!(store.total_quantity(), 3);
        assert_eq!(store.total_price(), Decimal::new(250, 0));
    }

    #[test]
    fn test_total_price_is_exact_for_fractional_prices() {
        let store = CartStore::new();
        store.add_item(CartItem {
            price: Decimal::new(1999, 2),
            ..item("a", 0, 3)
        });
        store.add_item(CartItem {
            price: Decimal::new(1, 1),
            ..item("b", 0, 7)
        });

        assert_eq!(store.total_price(), Decimal::new(6067, 2));
    }

    #[test]
    fn test_adding_existing_id_is_a_noop() {
        let store = CartStore::new();
        let (calls, _subscription) = counting(&store);

        assert!(store.add_item(item("a", 100, 2)));
        assert!(!store.add_item(item("a", 100, 5)));

        let state = store.get();
        assert_eq!(state.items().len(), 1);
        assert_eq!(state.items()[0].quantity.get(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_update_quantity_rejects_zero_and_negative() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 2));
        let (calls, _subscription) = counting(&store);
        let before = store.get();

        for bad in [0, -1, -50] {
            let err = store.update_quantity(&ProductId::new("a"), bad).unwrap_err();
            assert!(matches!(err, CartError::Validation(_)));
        }

        assert_eq!(*store.get(), *before);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_update_quantity_rejects_overflow() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 2));

        let err = store
            .update_quantity(&ProductId::new("a"), i64::from(u32::MAX) + 1)
            .unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
    }

    #[test]
    fn test_update_quantity_unknown_id() {
        let store = CartStore::new();
        let err = store.update_quantity(&ProductId::new("zz"), 2).unwrap_err();
        assert_eq!(err, CartError::NotInCart(ProductId::new("zz")));
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 2));
        let (calls, _subscription) = counting(&store);

        store.update_quantity(&ProductId::new("a"), 5).unwrap();
        assert_eq!(store.total_quantity(), 5);

        // Same value again is not a change.
        store.update_quantity(&ProductId::new("a"), 5).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_item_and_remove_all() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 2));
        store.add_item(item("b", 50, 1));
        let (calls, _subscription) = counting(&store);

        assert!(store.remove_item(&ProductId::new("a")));
        assert!(!store.remove_item(&ProductId::new("a")));
        assert_eq!(store.get().items().len(), 1);

        assert!(store.remove_all());
        assert!(!store.remove_all());
        assert!(store.get().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let store = CartStore::new();
        store.add_item(item("a", 100, 1));
        let snapshot = store.get();

        store.add_item(item("b", 50, 1));
        store.remove_item(&ProductId::new("a"));

        assert_eq!(snapshot.items().len(), 1);
        assert_eq!(snapshot.items()[0].id, ProductId::new("a"));
    }

    #[test]
    fn test_listener_receives_new_snapshot() {
        let store = CartStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(move |state| {
            sink.lock().unwrap().push(state.total_quantity());
        });

        store.add_item(item("a", 100, 2));
        store.add_item(item("b", 50, 3));
        store.remove_all();

        assert_eq!(*seen.lock().unwrap(), vec![2, 5, 0]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = CartStore::new();
        let (calls, subscription) = counting(&store);

        store.add_item(item("a", 100, 1));
        subscription.unsubscribe();
        store.add_item(item("b", 100, 1));

        let (dropped_calls, dropped) = counting(&store);
        drop(dropped);
        store.remove_all();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(dropped_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_may_read_store() {
        let store = Arc::new(CartStore::new());
        let reader = Arc::clone(&store);
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(move |_| {
            let total = usize::try_from(reader.total_quantity()).unwrap();
            sink.store(total, Ordering::SeqCst);
        });

        store.add_item(item("a", 10, 4));
        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_add_item_rejects_out_of_range_prices() {
        let store = CartStore::new();
        let (calls, _subscription) = counting(&store);

        let out_of_range = [
            Decimal::ZERO,
            Decimal::new(-1500, 0),
            MAX_UNIT_PRICE + Decimal::ONE,
            Decimal::MAX,
        ];
        for price in out_of_range {
            assert!(!store.add_item(CartItem {
                price,
                ..item("a", 0, 2)
            }));
        }

        assert!(store.get().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.add_item(CartItem {
            price: MAX_UNIT_PRICE,
            ..item("a", 0, 2)
        }));
    }

    #[test]
    fn test_check_price() {
        assert_eq!(check_price(Decimal::new(1999, 2)), Ok(Decimal::new(1999, 2)));
        assert_eq!(
            check_price(Decimal::new(-1, 0)),
            Err(CartError::InvalidPrice(Decimal::new(-1, 0)))
        );
        assert!(check_price(Decimal::MAX).is_err());
    }

    #[test]
    fn test_totals_saturate_instead_of_overflowing() {
        let line = CartItem {
            price: Decimal::MAX,
            ..item("a", 0, 2)
        };
        assert_eq!(line.line_total(), Decimal::MAX);

        let state = CartState {
            items: vec![line, item("b", 10, 1)],
        };
        assert_eq!(state.total_price(), Decimal::MAX);
    }

    #[test]
    fn test_concurrent_writers_notify_in_commit_order() {
        let store = CartStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _subscription = store.subscribe(move |state| {
            std::thread::yield_now();
            sink.lock().unwrap().push(state.items().len());
        });

        std::thread::scope(|scope| {
            for writer in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for n in 0..25 {
                        store.add_item(item(&format!("w{writer}-{n}"), 10, 1));
                    }
                });
            }
        });

        let expected: Vec<usize> = (1..=200).collect();
        assert_eq!(*seen.lock().unwrap(), expected);
        assert_eq!(store.total_quantity(), 200);
    }

    #[test]
    fn test_from_state_drops_invalid_prices() {
        let state: CartState = serde_json::from_value(serde_json::json!({
            "items": [
                {"id": "a", "name": "A", "price": "79228162514264337593543950335", "quantity": 2},
                {"id": "b", "name": "B", "price": "-10", "quantity": 1},
                {"id": "c", "name": "C", "price": "250", "quantity": 1}
            ]
        }))
        .unwrap();

        let store = CartStore::from_state(state);
        assert_eq!(store.get().items().len(), 1);
        assert_eq!(store.total_price(), Decimal::new(250, 0));
    }

    #[test]
    fn test_from_state_drops_duplicates() {
        let state: CartState = serde_json::from_value(serde_json::json!({
            "items": [
                {"id": "a", "name": "A", "price": "10", "quantity": 1},
                {"id": "a", "name": "A", "price": "10", "quantity": 3},
                {"id": "b", "name": "B", "price": "5.50", "quantity": 2}
            ]
        }))
        .unwrap();

        let store = CartStore::from_state(state);
        assert_eq!(store.total_quantity(), 3);
        assert_eq!(store.total_price(), Decimal::new(21, 0));
    }
}
