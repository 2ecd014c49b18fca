//! 訂單金額計算：品項數量折扣 → 整單折扣 → 稅金
//!
//! 純函式，不做任何 I/O，也不做四捨五入；金額格式化交給 `core::render`。

use crate::domain::model::{LineResult, OrderResult, RequestedLine};
use rust_decimal::Decimal;

/// 同一品項數量達到此值即享品項折扣
pub const ITEM_DISCOUNT_THRESHOLD: u32 = 5;
/// 0.10
pub const ITEM_DISCOUNT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
/// 品項折扣後小計必須「大於」此值才享整單折扣
pub const BULK_DISCOUNT_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
/// 0.05
pub const BULK_DISCOUNT_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// 0.12
pub const TAX_RATE: Decimal = Decimal::from_parts(12, 0, 0, false, 2);

/// 整單折扣、稅金與總額；任何一步溢位則回傳 None
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    bulk_discount: Decimal,
    final_subtotal: Decimal,
    tax: Decimal,
    final_total: Decimal,
}

impl Totals {
    fn for_subtotal(subtotal: Decimal) -> Option<Self> {
        let bulk_discount = if subtotal > BULK_DISCOUNT_THRESHOLD {
            subtotal.checked_mul(BULK_DISCOUNT_RATE)?
        } else {
            Decimal::ZERO
        };
        let final_subtotal = subtotal.checked_sub(bulk_discount)?;
        let tax = final_subtotal.checked_mul(TAX_RATE)?;
        let final_total = final_subtotal.checked_add(tax)?;

        Some(Self {
            bulk_discount,
            final_subtotal,
            tax,
            final_total,
        })
    }
}

#[derive(Default)]
struct Accumulator {
    items: Vec<LineResult>,
    subtotal: Decimal,
    item_discounts: Decimal,
    totals: Totals,
}

impl Accumulator {
    /// 加入後總額仍可計算才收下這一行，否則略過
    fn push(mut self, line: LineResult) -> Self {
        let next = self.subtotal.checked_add(line.subtotal).and_then(|subtotal| {
            let discounts = self.item_discounts.checked_add(line.discount)?;
            Some((subtotal, discounts, Totals::for_subtotal(subtotal)?))
        });

        match next {
            Some((subtotal, item_discounts, totals)) => {
                self.subtotal = subtotal;
                self.item_discounts = item_discounts;
                self.totals = totals;
                self.items.push(line);
            }
            None => tracing::warn!("Skipping line '{}': order total overflows", line.name),
        }
        self
    }
}

/// 計算整筆訂單。空的或全部無效的輸入會得到全為零的結果，不會回傳錯誤。
pub fn calculate(lines: &[RequestedLine]) -> OrderResult {
    let Accumulator {
        items,
        subtotal,
        item_discounts,
        totals,
    } = lines
        .iter()
        .filter_map(price_line)
        .fold(Accumulator::default(), Accumulator::push);

    tracing::debug!(
        "Calculated order: {} lines, subtotal {}, item discounts {}, bulk discount {}, tax {}, total {}",
        items.len(),
        subtotal,
        item_discounts,
        totals.bulk_discount,
        totals.tax,
        totals.final_total
    );

    OrderResult {
        items,
        subtotal,
        item_discounts,
        has_bulk_discount: totals.bulk_discount > Decimal::ZERO,
        bulk_discount: totals.bulk_discount,
        final_subtotal: totals.final_subtotal,
        tax: totals.tax,
        final_total: totals.final_total,
    }
}

/// 單一品項的小計與折扣；不合格的品項回傳 None（直接略過）
fn price_line(line: &RequestedLine) -> Option<LineResult> {
    let item = &line.item;
    if item.name.trim().is_empty() || item.price <= Decimal::ZERO || line.quantity == 0 {
        tracing::debug!(
            "Skipping line '{}' (price {}, quantity {})",
            item.id,
            item.price,
            line.quantity
        );
        return None;
    }

    let Some(line_total) = item.price.checked_mul(Decimal::from(line.quantity)) else {
        tracing::warn!("Skipping line '{}': line total overflows", item.id);
        return None;
    };

    let has_discount = line.quantity >= ITEM_DISCOUNT_THRESHOLD;
    let discount = if has_discount {
        line_total.checked_mul(ITEM_DISCOUNT_RATE)?
    } else {
        Decimal::ZERO
    };

    Some(LineResult {
        name: item.name.clone(),
        price: item.price,
        quantity: line.quantity,
        line_total,
        subtotal: line_total.checked_sub(discount)?,
        discount,
        has_discount,
    })
}
