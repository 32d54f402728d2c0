//! Shopping cart held in the session.

use serde::{Deserialize, Serialize};

use bazaar_core::ProductId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Product quantities chosen by a shopper for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Add `quantity` of a product, merging with an existing line. A line
    /// never exceeds [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(quantity).min(MAX_LINE_QUANTITY);
            }
            None => self.lines.push(CartLine {
                product_id,
                quantity: quantity.min(MAX_LINE_QUANTITY),
            }),
        }
    }

    /// Set the quantity of a product; zero or less removes the line.
    pub fn update(&mut self, product_id: &ProductId, quantity: i64) {
        match u32::try_from(quantity) {
            Ok(q) if q > 0 => {
                if let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) {
                    line.quantity = q.min(MAX_LINE_QUANTITY);
                }
            }
            _ => self.remove(product_id),
        }
    }

    pub fn remove(&mut self, product_id: &ProductId) {
        self.lines.retain(|l| &l.product_id != product_id);
    }

    /// Units of one product in the cart.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        total_quantity(self.lines.iter().map(|l| l.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Sum of quantities, saturating instead of overflowing.
pub fn total_quantity(quantities: impl IntoIterator<Item = u32>) -> u32 {
    quantities.into_iter().fold(0, u32::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_merges_lines() {
        let mut cart = Cart::default();
        cart.add(ProductId::new("p1"), 2);
        cart.add(ProductId::new("p2"), 1);
        cart.add(ProductId::new("p1"), 3);
        cart.add(ProductId::new("p3"), 0);

        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 5);
        assert_eq!(cart.item_count(), 6);
    }

    #[test]
    fn test_update_to_zero_removes() {
        let mut cart = Cart::default();
        cart.add(ProductId::new("p1"), 2);
        cart.add(ProductId::new("p2"), 2);

        cart.update(&ProductId::new("p1"), 7);
        assert_eq!(cart.item_count(), 9);

        cart.update(&ProductId::new("p1"), 0);
        cart.update(&ProductId::new("p2"), -1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_quantities_are_capped() {
        let mut cart = Cart::default();
        cart.add(ProductId::new("p1"), u32::MAX);
        cart.add(ProductId::new("p1"), 5);
        cart.add(ProductId::new("p2"), 2);
        assert_eq!(cart.quantity_of(&ProductId::new("p1")), MAX_LINE_QUANTITY);
        assert_eq!(cart.item_count(), MAX_LINE_QUANTITY + 2);

        cart.update(&ProductId::new("p2"), i64::MAX);
        assert_eq!(cart.quantity_of(&ProductId::new("p2")), MAX_LINE_QUANTITY);
        assert_eq!(cart.quantity_of(&ProductId::new("p3")), 0);
    }

    #[test]
    fn test_total_quantity_saturates() {
        assert_eq!(total_quantity([u32::MAX, 2]), u32::MAX);
        assert_eq!(total_quantity([1, 2, 3]), 6);
    }

    #[test]
    fn test_update_unknown_product_is_noop() {
        let mut cart = Cart::default();
        cart.update(&ProductId::new("ghost"), 4);
        assert!(cart.is_empty());
    }
}
