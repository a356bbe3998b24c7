//! Checkout request types.
//!
//! [`CheckoutRequest`] is the JSON body the cart sends to the storefront's
//! checkout endpoint:
//!
//! ```json
//! {"items": [{"name": "Classic", "amount": 850, "quantity": 3}], "customerEmail": "a@b.c"}
//! ```
//!
//! Fields are deliberately loose on the wire (signed integers, plain strings)
//! so that [`CheckoutRequest::validate`] can report precisely what is wrong
//! instead of failing inside the JSON parser. A validated request becomes a
//! [`CheckoutOrder`], which is what the payment client accepts.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cart_line::{CartLine, Quantity};
use super::email::{Email, EmailError};
use super::price::{MinorUnits, MoneyError, to_minor_units};

/// Maximum number of line items in one checkout session (payment provider limit).
pub const MAX_LINE_ITEMS: usize = 100;

/// Reasons a checkout request is rejected before reaching the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// No line items were supplied.
    #[error("checkout requires at least one item")]
    NoItems,
    /// More line items than the payment provider accepts.
    #[error("checkout supports at most {max} items (got {got})")]
    TooManyItems {
        /// Limit.
        max: usize,
        /// Supplied count.
        got: usize,
    },
    /// An item has a blank name.
    #[error("item {index} has an empty name")]
    EmptyName {
        /// Zero-based item position.
        index: usize,
    },
    /// An item amount is zero or negative.
    #[error("item {index} must have a positive amount (got {amount})")]
    NonPositiveAmount {
        /// Zero-based item position.
        index: usize,
        /// Supplied amount.
        amount: i64,
    },
    /// An item quantity is zero or negative.
    #[error("item {index} must have a quantity of at least 1 (got {quantity})")]
    NonPositiveQuantity {
        /// Zero-based item position.
        index: usize,
        /// Supplied quantity.
        quantity: i64,
    },
    /// The customer email is malformed.
    #[error("invalid customer email: {0}")]
    InvalidEmail(#[from] EmailError),
}

/// One requested line item, as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItemInput {
    /// Display name shown on the hosted payment page.
    pub name: String,
    /// Unit amount in minor currency units.
    pub amount: i64,
    /// Number of units.
    pub quantity: i64,
}

/// Body of the checkout endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Requested line items, in display order.
    #[serde(default)]
    pub items: Vec<CheckoutItemInput>,
    /// Optional email to prefill on the payment page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
}

/// A validated line item ready for the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutItem {
    /// Display name.
    pub name: String,
    /// Unit amount in minor currency units, always positive.
    pub amount: MinorUnits,
    /// Number of units.
    pub quantity: Quantity,
}

/// A validated checkout request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutOrder {
    /// Line items, at least one.
    pub items: Vec<CheckoutItem>,
    /// Customer email, when supplied.
    pub customer_email: Option<Email>,
}

impl CheckoutRequest {
    /// Build a request from cart lines, converting unit prices to minor units.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if a unit price cannot be expressed in minor units.
    pub fn from_lines<'a>(
        lines: impl IntoIterator<Item = &'a CartLine>,
        customer_email: Option<&str>,
    ) -> Result<Self, MoneyError> {
        let items = lines
            .into_iter()
            .map(|line| {
                let amount = to_minor_units(line.unit_price())?;
                Ok(CheckoutItemInput {
                    name: line.name.clone(),
                    amount: i64::try_from(amount).map_err(|_| MoneyError::Overflow(line.unit_price()))?,
                    quantity: i64::from(line.quantity.get()),
                })
            })
            .collect::<Result<Vec<_>, MoneyError>>()?;

        Ok(Self {
            items,
            customer_email: customer_email.map(str::to_owned),
        })
    }

    /// Validate the request.
    ///
    /// A blank customer email is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] found, checking the item list
    /// before the email.
    pub fn validate(self) -> Result<CheckoutOrder, CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::NoItems);
        }
        if self.items.len() > MAX_LINE_ITEMS {
            return Err(CheckoutError::TooManyItems {
                max: MAX_LINE_ITEMS,
                got: self.items.len(),
            });
        }

        let items = self
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let name = item.name.trim();
                if name.is_empty() {
                    return Err(CheckoutError::EmptyName { index });
                }
                let amount = u64::try_from(item.amount)
                    .ok()
                    .filter(|amount| *amount > 0)
                    .ok_or(CheckoutError::NonPositiveAmount {
                        index,
                        amount: item.amount,
                    })?;
                let quantity =
                    Quantity::new(item.quantity).map_err(|_| CheckoutError::NonPositiveQuantity {
                        index,
                        quantity: item.quantity,
                    })?;

                Ok(CheckoutItem {
                    name: name.to_owned(),
                    amount,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let customer_email = self
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(Email::parse)
            .transpose()?;

        Ok(CheckoutOrder {
            items,
            customer_email,
        })
    }
}
