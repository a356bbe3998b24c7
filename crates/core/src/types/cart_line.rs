//! Cart line items.
//!
//! A [`CartLine`] is one distinct product in a cart. Its invariants are
//! enforced at construction and again on deserialization, so a line read back
//! from storage is as trustworthy as one built in code:
//!
//! - the product id is non-empty
//! - the unit price is non-negative
//! - the quantity is at least one ([`Quantity`] cannot hold zero)

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::ProductId;

/// Errors building a [`CartLine`] or [`Quantity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartLineError {
    /// The product id is empty.
    #[error("product id cannot be empty")]
    EmptyId,
    /// The unit price is below zero.
    #[error("unit price cannot be negative: {0}")]
    NegativePrice(Decimal),
    /// The quantity is zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    NonPositiveQuantity(i64),
}

/// A strictly positive item count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A quantity of one.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from a signed count.
    ///
    /// # Errors
    ///
    /// Returns [`CartLineError::NonPositiveQuantity`] when `count < 1`.
    pub fn new(count: i64) -> Result<Self, CartLineError> {
        u32::try_from(count.clamp(0, i64::from(u32::MAX)))
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CartLineError::NonPositiveQuantity(count))
    }

    /// Get the count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Add another quantity, saturating at `u32::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0.get()))
    }

    /// Subtract one; `None` when the result would be zero.
    #[must_use]
    pub fn decremented(self) -> Option<Self> {
        NonZeroU32::new(self.0.get() - 1).map(Self)
    }
}

impl From<NonZeroU32> for Quantity {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = CartLineError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

/// One distinct product in the cart.
///
/// Serialized as `{"id", "name", "unitPrice", "image", "quantity"}` with the
/// unit price as a JSON number. The id and price are fixed once the line is
/// built; go through [`CartLine::new`] to get one.
///
/// ```compile_fail
/// # use kebab_core::{CartLine, ProductId, Quantity};
/// # use rust_decimal::Decimal;
/// let line = CartLine {
///     id: ProductId::new(""),
///     name: "Classic".to_string(),
///     unit_price: Decimal::NEGATIVE_ONE,
///     image: None,
///     quantity: Quantity::ONE,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCartLine")]
pub struct CartLine {
    id: ProductId,
    /// Display label.
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    /// Optional image reference.
    pub image: Option<String>,
    /// Number of units.
    pub quantity: Quantity,
}

impl CartLine {
    /// Build a validated line.
    ///
    /// # Errors
    ///
    /// Returns an error when the id is empty or the price is negative.
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: Quantity,
    ) -> Result<Self, CartLineError> {
        let id = id.into();
        if id.as_str().is_empty() {
            return Err(CartLineError::EmptyId);
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(CartLineError::NegativePrice(unit_price));
        }

        Ok(Self {
            id,
            name: name.into(),
            unit_price,
            image: None,
            quantity,
        })
    }

    /// Stable product identifier; the cart's uniqueness key.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        &self.id
    }

    /// Price of one unit, in euros.
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity.get())
    }
}

/// Unvalidated wire form of a [`CartLine`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCartLine {
    id: ProductId,
    name: String,
    #[serde(with = "rust_decimal::serde::float")]
    unit_price: Decimal,
    #[serde(default)]
    image: Option<String>,
    quantity: i64,
}

impl TryFrom<RawCartLine> for CartLine {
    type Error = CartLineError;

    fn try_from(raw: RawCartLine) -> Result<Self, Self::Error> {
        let mut line = Self::new(raw.id, raw.name, raw.unit_price, Quantity::new(raw.quantity)?)?;
        line.image = raw.image;
        Ok(line)
    }
}
