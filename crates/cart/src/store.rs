//! The cart store.

use std::fmt;

use kebab_core::{CartLine, CheckoutRequest, MoneyError};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::legacy::{self, LEGACY_CART_KEY};
use crate::slot::{CartSlot, SlotError};

/// Storage key for the persisted cart.
///
/// Versioned so a future snapshot format can live under a new key without
/// breaking clients that still hold the old one. `cart_v1` holds the first
/// format and is migrated on [`CartStore::open`].
pub const CART_KEY: &str = "cart_v2";

/// Flat delivery fee added to every order (2.50).
pub const DEFAULT_DELIVERY_FEE: Decimal = Decimal::from_parts(250, 0, 0, false, 2);

/// A persistence failure. Never returned to callers; logged and passed to the
/// hook registered with [`CartStoreBuilder::on_persistence_error`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The stored snapshot could not be read.
    #[error("failed to read cart snapshot: {0}")]
    Read(#[source] SlotError),

    /// The stored snapshot is not a valid list of cart lines.
    #[error("cart snapshot is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The cart could not be serialized.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    /// The snapshot could not be written.
    #[error("failed to write cart snapshot: {0}")]
    Write(#[source] SlotError),
}

type ErrorHook = Box<dyn Fn(&PersistenceError) + Send + Sync>;

/// Builder for [`CartStore`].
#[derive(Default)]
pub struct CartStoreBuilder {
    delivery_fee: Option<Decimal>,
    on_error: Option<ErrorHook>,
}

impl CartStoreBuilder {
    /// Override the delivery fee. Negative values are clamped to zero.
    #[must_use]
    pub fn delivery_fee(mut self, fee: Decimal) -> Self {
        self.delivery_fee = Some(fee.max(Decimal::ZERO));
        self
    }

    /// Observe persistence failures (corrupt snapshots, failed writes).
    #[must_use]
    pub fn on_persistence_error(
        mut self,
        hook: impl Fn(&PersistenceError) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Build a store with no storage, for server or non-interactive contexts.
    #[must_use]
    pub fn detached(self) -> CartStore {
        CartStore {
            lines: Vec::new(),
            delivery_fee: self.delivery_fee.unwrap_or(DEFAULT_DELIVERY_FEE),
            slot: None,
            on_error: self.on_error,
        }
    }

    /// Build a store backed by `slot`, rehydrating the last snapshot.
    ///
    /// A missing snapshot yields an empty cart. An unreadable or malformed
    /// snapshot also yields an empty cart; the failure is reported to the
    /// hook and logged. When only a `cart_v1` snapshot exists it is converted
    /// and written under [`CART_KEY`].
    #[must_use]
    pub fn open(self, slot: impl CartSlot + 'static) -> CartStore {
        let mut store = self.detached();
        let (lines, migrated) = store.rehydrate(&slot);
        store.lines = lines;
        store.slot = Some(Box::new(slot));
        if migrated {
            store.persist();
        }
        store
    }
}

/// A shopping cart with derived totals and write-through persistence.
///
/// Invariants, upheld by every operation:
/// - no two lines share a product id
/// - every line has a quantity of at least one
///
/// Totals are computed from the lines on every read and never stored.
pub struct CartStore {
    lines: Vec<CartLine>,
    delivery_fee: Decimal,
    slot: Option<Box<dyn CartSlot>>,
    on_error: Option<ErrorHook>,
}

impl CartStore {
    /// Start configuring a store.
    #[must_use]
    pub fn builder() -> CartStoreBuilder {
        CartStoreBuilder::default()
    }

    /// Open a store on `slot` with default settings.
    #[must_use]
    pub fn open(slot: impl CartSlot + 'static) -> Self {
        Self::builder().open(slot)
    }

    /// Create an empty store that never persists.
    #[must_use]
    pub fn detached() -> Self {
        Self::builder().detached()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line, merging into an existing line with the same id.
    ///
    /// When the id is already present only the quantity changes; the existing
    /// name, price and image are kept.
    pub fn add(&mut self, line: CartLine) {
        debug!(product_id = %line.id(), quantity = line.quantity.get(), "Adding to cart");
        match self.lines.iter_mut().find(|l| l.id() == line.id()) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => self.lines.push(line),
        }
        self.persist();
    }

    /// Increase a line's quantity by one. No-op if the id is absent.
    pub fn increment(&mut self, id: &str) {
        if let Some(line) = self.lines.iter_mut().find(|l| *l.id() == *id) {
            line.quantity = line.quantity.saturating_add(kebab_core::Quantity::ONE);
            self.persist();
        }
    }

    /// Decrease a line's quantity by one, removing it when it reaches zero.
    /// No-op if the id is absent.
    pub fn decrement(&mut self, id: &str) {
        let Some(index) = self.position(id) else {
            return;
        };
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };

        match line.quantity.decremented() {
            Some(quantity) => {
                line.quantity = quantity;
                self.persist();
            }
            None => self.remove(id),
        }
    }

    /// Remove a line. Persists even when the id is absent.
    pub fn remove(&mut self, id: &str) {
        self.lines.retain(|l| *l.id() != *id);
        self.persist();
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.persist();
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| *l.id() == *id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether this store writes to storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.slot.is_some()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    /// Sum of `unit_price × quantity` over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// The flat delivery fee.
    #[must_use]
    pub const fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    /// `subtotal + delivery_fee`.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.subtotal() + self.delivery_fee
    }

    /// Build the body for the checkout endpoint from the current lines.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if a price cannot be expressed in cents.
    pub fn checkout_request(&self, customer_email: Option<&str>) -> Result<CheckoutRequest, MoneyError> {
        CheckoutRequest::from_lines(&self.lines, customer_email)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn position(&self, id: &str) -> Option<usize> {
        self.lines.iter().position(|l| *l.id() == *id)
    }

    /// Read the current snapshot, falling back to `cart_v1`. The flag is set
    /// when the lines came from the old key.
    fn rehydrate(&self, slot: &dyn CartSlot) -> (Vec<CartLine>, bool) {
        match slot.load(CART_KEY) {
            Ok(Some(raw)) => {
                let lines = self.decode(serde_json::from_str(&raw));
                debug!(lines = lines.len(), "Cart restored from storage");
                return (lines, false);
            }
            Ok(None) => {}
            Err(e) => {
                self.report(&PersistenceError::Read(e));
                return (Vec::new(), false);
            }
        }

        match slot.load(LEGACY_CART_KEY) {
            Ok(Some(raw)) => {
                let lines = self.decode(legacy::decode(&raw));
                info!(
                    lines = lines.len(),
                    from = LEGACY_CART_KEY,
                    to = CART_KEY,
                    "Migrating cart snapshot"
                );
                (lines, true)
            }
            Ok(None) => (Vec::new(), false),
            Err(e) => {
                self.report(&PersistenceError::Read(e));
                (Vec::new(), false)
            }
        }
    }

    fn decode(&self, parsed: Result<Vec<CartLine>, serde_json::Error>) -> Vec<CartLine> {
        parsed.map(dedupe).unwrap_or_else(|e| {
            self.report(&PersistenceError::Corrupt(e));
            Vec::new()
        })
    }

    fn persist(&self) {
        let Some(slot) = &self.slot else {
            return;
        };

        let result = serde_json::to_string(&self.lines)
            .map_err(PersistenceError::Encode)
            .and_then(|json| slot.save(CART_KEY, &json).map_err(PersistenceError::Write));

        if let Err(e) = result {
            self.report(&e);
        }
    }

    fn report(&self, error: &PersistenceError) {
        warn!(error = %error, "Cart persistence failed; continuing in memory");
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("delivery_fee", &self.delivery_fee)
            .field("persistent", &self.slot.is_some())
            .finish_non_exhaustive()
    }
}

/// Merge duplicate ids in a restored snapshot the same way `add` would.
fn dedupe(lines: Vec<CartLine>) -> Vec<CartLine> {
    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|l| l.id() == line.id()) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(line.quantity),
            None => merged.push(line),
        }
    }
    merged
}
