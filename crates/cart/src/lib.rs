//! Kebab House cart store.
//!
//! The cart lives on the presentation side: it is created per page/session,
//! owned by whoever renders the menu, and mirrored to a client-local key-value
//! slot after every mutation so a reload does not lose the order.
//!
//! # Architecture
//!
//! - [`CartStore`] - The cart itself. Mutators take `&mut self`, so a single
//!   owner serializes mutations by construction.
//! - [`SharedCart`] - Cloneable handle for code that needs to mutate one cart
//!   from several tasks.
//! - [`CartSlot`] - The persistence seam. [`MemorySlot`] and [`FileSlot`] are
//!   provided; a browser build would implement it over `localStorage`.
//!
//! There is no process-wide cart. A server never holds one: carts built in a
//! server context use [`CartStore::detached`], which never touches storage.
//!
//! # Example
//!
//! ```rust
//! use std::str::FromStr;
//!
//! use kebab_cart::{CartStore, MemorySlot};
//! use kebab_core::{CartLine, Quantity};
//! use rust_decimal::Decimal;
//!
//! let slot = MemorySlot::new();
//! let mut cart = CartStore::open(slot.clone());
//!
//! let price = Decimal::from_str("8.5").unwrap();
//! cart.add(CartLine::new("burger-1", "Classic", price, Quantity::ONE).unwrap());
//! cart.add(CartLine::new("burger-1", "Classic", price, Quantity::new(2).unwrap()).unwrap());
//!
//! assert_eq!(cart.item_count(), 3);
//! assert_eq!(cart.total(), Decimal::from_str("28.0").unwrap());
//!
//! // A new store on the same slot sees the same cart.
//! let reloaded = CartStore::open(slot);
//! assert_eq!(reloaded.lines(), cart.lines());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod legacy;
mod shared;
mod slot;
mod store;

pub use legacy::LEGACY_CART_KEY;
pub use shared::SharedCart;
pub use slot::{CartSlot, FileSlot, MemorySlot, SlotError};
pub use store::{CART_KEY, CartStore, CartStoreBuilder, DEFAULT_DELIVERY_FEE, PersistenceError};
