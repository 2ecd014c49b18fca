//! 購物車：以品項 id 為鍵的數量暫存區，只負責顯示用的小計，
//! 折扣與稅金一律在提交後由 `calculator` 計算。

use crate::core::form::{FormSubmission, QUANTITY_PREFIX};
use crate::core::CatalogItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("Item '{0}' is not in the cart")]
    ItemNotFound(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl CartEntry {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入品項；已存在時累加數量
    pub fn add(&mut self, item: &CatalogItem, quantity: u32) {
        if quantity == 0 {
            return;
        }

        match self.entries.iter_mut().find(|entry| entry.id == item.id) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(quantity),
            None => self.entries.push(CartEntry {
                id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity,
            }),
        }
    }

    /// 數量設為 0 時移除該品項
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> Result<(), CartError> {
        let position = self.position(id)?;
        if quantity == 0 {
            self.entries.remove(position);
        } else {
            self.entries[position].quantity = quantity;
        }
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<CartEntry, CartError> {
        let position = self.position(id)?;
        Ok(self.entries.remove(position))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, id: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 未折扣的顯示用小計
    pub fn subtotal(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// 轉成 `quantity_<id>` 表單欄位，這是購物車與計算邏輯唯一的同步點
    pub fn to_submission(&self) -> FormSubmission {
        FormSubmission::from_pairs(self.entries.iter().map(|entry| {
            (
                format!("{}{}", QUANTITY_PREFIX, entry.id),
                entry.quantity.to_string(),
            )
        }))
    }

    fn position(&self, id: &str) -> Result<usize, CartError> {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| CartError::ItemNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::Catalog;
    use crate::core::form::resolve_catalog_lines;

    fn pad() -> CatalogItem {
        CatalogItem::new("1", "Brake Pad", Decimal::new(4550, 2), "brakes")
    }

    fn plug() -> CatalogItem {
        CatalogItem::new("2", "Spark Plug", Decimal::new(825, 2), "ignition")
    }

    #[test]
    fn test_add_accumulates_quantity() {
        let mut cart = Cart::new();
        cart.add(&pad(), 2);
        cart.add(&plug(), 1);
        cart.add(&pad(), 3);
        cart.add(&plug(), 0);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.get("1").unwrap().quantity, 5);
        assert_eq!(cart.subtotal(), Decimal::new(23575, 2));
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add(&pad(), 2);
        cart.add(&plug(), 4);

        cart.set_quantity("2", 1).unwrap();
        assert_eq!(cart.get("2").unwrap().quantity, 1);

        cart.set_quantity("1", 0).unwrap();
        assert!(cart.get("1").is_none());

        assert_eq!(
            cart.set_quantity("9", 1),
            Err(CartError::ItemNotFound("9".to_string()))
        );

        let removed = cart.remove("2").unwrap();
        assert_eq!(removed.name, "Spark Plug");
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_submission_round_trips_through_form_resolution() {
        let mut cart = Cart::new();
        cart.add(&plug(), 6);
        cart.add(&pad(), 1);

        let submission = cart.to_submission();
        assert_eq!(submission.to_urlencoded(), "quantity_2=6&quantity_1=1");

        let catalog = Catalog::new(vec![pad(), plug()]);
        let resolution = resolve_catalog_lines(&submission, &catalog);
        assert_eq!(resolution.lines.len(), 2);
        assert_eq!(resolution.lines[0].item.id, "2");
        assert_eq!(resolution.lines[0].quantity, 6);
        assert!(resolution.rejected.is_empty());
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add(&pad(), 1);
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.to_submission().is_empty());
    }
}
