//! Reading carts saved under the first storage key.
//!
//! The first storefront wrote `cart_v1` as `[{id, nom, prix, image, qty}]`.
//! Those snapshots are read once, converted, and rewritten under the current
//! key; the old key is left as it was.

use kebab_core::{CartLine, CartLineError, Quantity};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Storage key of the first snapshot format.
pub const LEGACY_CART_KEY: &str = "cart_v1";

#[derive(Deserialize)]
struct LegacyFields {
    id: String,
    nom: String,
    #[serde(with = "rust_decimal::serde::float")]
    prix: Decimal,
    #[serde(default)]
    image: Option<String>,
    qty: i64,
}

/// A `cart_v1` entry that passed the same checks as a current line.
#[derive(Deserialize)]
#[serde(try_from = "LegacyFields")]
struct LegacyLine(CartLine);

impl TryFrom<LegacyFields> for LegacyLine {
    type Error = CartLineError;

    fn try_from(raw: LegacyFields) -> Result<Self, Self::Error> {
        let line = CartLine::new(raw.id, raw.nom, raw.prix, Quantity::new(raw.qty)?)?;
        Ok(Self(match raw.image {
            Some(image) => line.with_image(image),
            None => line,
        }))
    }
}

/// Decode a `cart_v1` snapshot.
///
/// # Errors
///
/// Fails when the JSON is malformed or any entry breaks a line invariant.
pub fn decode(raw: &str) -> Result<Vec<CartLine>, serde_json::Error> {
    let lines: Vec<LegacyLine> = serde_json::from_str(raw)?;
    Ok(lines.into_iter().map(|LegacyLine(line)| line).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_decode_first_format() {
        let lines = decode(
            r#"[{"id":"burger-1","nom":"Classic","prix":8.5,"image":null,"qty":3},
                {"id":"ayran","nom":"Ayran","prix":2.5,"image":"/img/ayran.jpg","qty":1}]"#,
        )
        .unwrap();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id().as_str(), "burger-1");
        assert_eq!(lines[0].name, "Classic");
        assert_eq!(lines[0].unit_price(), Decimal::from_str("8.5").unwrap());
        assert_eq!(lines[0].quantity.get(), 3);
        assert_eq!(lines[0].image, None);
        assert_eq!(lines[1].image.as_deref(), Some("/img/ayran.jpg"));
    }

    #[test]
    fn test_decode_applies_line_checks() {
        assert!(decode(r#"[{"id":"a","nom":"A","prix":1,"qty":0}]"#).is_err());
        assert!(decode(r#"[{"id":"","nom":"A","prix":1,"qty":1}]"#).is_err());
        assert!(decode(r#"[{"id":"a","name":"A","unitPrice":1,"quantity":1}]"#).is_err());
    }
}
