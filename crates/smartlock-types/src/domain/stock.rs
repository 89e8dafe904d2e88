use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::validation::{ValidationErrors, Validator};

/// One line of a reservation batch. Batches hold each product at most once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockReservation {
    pub product_id: i64,
    pub quantity: u32,
}

/// A product that could not back its requested quantity.
/// `available` is `None` when the product does not exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockShortage {
    pub product_id: i64,
    pub requested: u32,
    pub available: Option<u32>,
}

/// A reservation that succeeded, with the catalog data captured at the moment
/// of the decrement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservedLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A cart line as the client sends it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
}

/// Folds cart lines into one reservation per distinct product, keeping the
/// order in which products first appear.
pub fn reservations_from_cart(lines: &[CartLine]) -> Result<Vec<StockReservation>, ValidationErrors> {
    let mut v = Validator::new();
    v.check("order_items", !lines.is_empty(), "must contain at least one item");

    let mut merged: Vec<StockReservation> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let ok_id = v.check(
            &format!("order_items[{i}].id"),
            line.product_id > 0,
            "must be a positive product id",
        );
        let qty = u32::try_from(line.quantity).ok().filter(|q| *q > 0);
        let ok_qty = v.check(
            &format!("order_items[{i}].quantity"),
            qty.is_some(),
            "must be a positive integer",
        );
        let (true, true, Some(qty)) = (ok_id, ok_qty, qty) else {
            continue;
        };
        match merged.iter_mut().find(|r| r.product_id == line.product_id) {
            Some(existing) => match existing.quantity.checked_add(qty) {
                Some(sum) => existing.quantity = sum,
                None => v.push(&format!("order_items[{i}].quantity"), "is too large"),
            },
            None => merged.push(StockReservation {
                product_id: line.product_id,
                quantity: qty,
            }),
        }
    }
    v.finish()?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_duplicate_products_in_first_seen_order() {
        let lines = [
            CartLine { product_id: 2, quantity: 1 },
            CartLine { product_id: 1, quantity: 2 },
            CartLine { product_id: 2, quantity: 3 },
        ];
        let merged = reservations_from_cart(&lines).unwrap();
        assert_eq!(
            merged,
            vec![
                StockReservation { product_id: 2, quantity: 4 },
                StockReservation { product_id: 1, quantity: 2 },
            ]
        );
    }

    #[test]
    fn rejects_empty_and_non_positive_lines() {
        assert!(reservations_from_cart(&[]).is_err());
        let err = reservations_from_cart(&[
            CartLine { product_id: 1, quantity: 0 },
            CartLine { product_id: -4, quantity: 1 },
        ])
        .unwrap_err();
        assert_eq!(
            err.fields().collect::<Vec<_>>(),
            vec!["order_items[0].quantity", "order_items[1].id"]
        );
    }
}
