//! Kebab House Core - Shared ordering types.
//!
//! This crate provides the types shared by every Kebab House component:
//! - `cart` - Client-side cart store with local persistence
//! - `storefront` - Checkout initiation and content query proxy
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere,
//! including in the browser-side cart.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, cart lines, money, emails, and checkout items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
