//! Core types for Kebab House.
//!
//! This module provides type-safe wrappers for common ordering concepts.

pub mod cart_line;
pub mod checkout;
pub mod email;
pub mod id;
pub mod price;

pub use cart_line::{CartLine, CartLineError, Quantity};
pub use checkout::{
    CheckoutError, CheckoutItem, CheckoutItemInput, CheckoutOrder, CheckoutRequest, MAX_LINE_ITEMS,
};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Currency, MinorUnits, MoneyError, to_minor_units};
