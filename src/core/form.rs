//! 表單提交邊界：把 `quantity_<id>` 之類的字串欄位轉成 `RequestedLine`
//!
//! 這裡只做「盡力而為」的解析：格式錯誤、數量為零、找不到的品項都直接丟棄，
//! 但會記錄在 `Resolution::rejected` 裡方便呼叫端顯示或記錄。

use crate::core::catalog::Catalog;
use crate::core::{CatalogItem, RequestedLine};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const QUANTITY_PREFIX: &str = "quantity_";
pub const NAME_PREFIX: &str = "name_";
pub const PRICE_PREFIX: &str = "price_";

/// 依提交順序保存的表單欄位
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析 application/x-www-form-urlencoded 內容
    pub fn from_urlencoded(body: &str) -> Self {
        let fields = url::form_urlencoded::parse(body.trim().as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { fields }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// 解析 `key=value` 形式的單一欄位（命令列參數使用）
    pub fn push_assignment(&mut self, assignment: &str) -> bool {
        match assignment.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                self.push(key.trim(), value);
                true
            }
            _ => false,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_urlencoded(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    ZeroQuantity,
    MalformedQuantity,
    UnknownItem,
    MissingField,
    MalformedPrice,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RejectReason::ZeroQuantity => "quantity is zero",
            RejectReason::MalformedQuantity => "quantity is not a whole number",
            RejectReason::UnknownItem => "no catalog item with this id",
            RejectReason::MissingField => "row is missing a name, price or quantity",
            RejectReason::MalformedPrice => "price is not a decimal number",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedField {
    pub key: String,
    pub value: String,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub lines: Vec<RequestedLine>,
    pub rejected: Vec<RejectedField>,
}

impl Resolution {
    fn reject(&mut self, key: &str, value: &str, reason: RejectReason) {
        tracing::debug!("Dropping form field {}={:?}: {}", key, value, reason);
        self.rejected.push(RejectedField {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        });
    }
}

/// 類似寬鬆的整數轉換："3abc" → 3，"abc" → 0，負數與溢位 → 0
pub fn coerce_quantity(raw: &str) -> u32 {
    parse_leading_int(raw).unwrap_or(0)
}

fn parse_leading_int(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }

    let value: u32 = digits.parse().ok()?;
    if negative && value > 0 {
        return None;
    }
    Some(value)
}

/// 以商品目錄解析 `quantity_<id>` 欄位。同一個 id 重複出現時以最後的數量為準，位置保留第一次出現的地方。
pub fn resolve_catalog_lines(form: &FormSubmission, catalog: &Catalog) -> Resolution {
    let mut resolution = Resolution::default();
    let mut requested: Vec<(&CatalogItem, &str, &str)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (key, value) in form.fields() {
        let Some(id) = key.strip_prefix(QUANTITY_PREFIX) else {
            continue;
        };

        let Some(item) = catalog.get(id.trim()) else {
            resolution.reject(key, value, RejectReason::UnknownItem);
            continue;
        };

        match positions.get(item.id.as_str()) {
            Some(&position) => requested[position] = (item, key, value),
            None => {
                positions.insert(item.id.as_str(), requested.len());
                requested.push((item, key, value));
            }
        }
    }

    for (item, key, value) in requested {
        match parse_leading_int(value) {
            Some(0) => resolution.reject(key, value, RejectReason::ZeroQuantity),
            // 空白欄位視為沒有選購，不算格式錯誤
            None if value.trim().is_empty() => {
                resolution.reject(key, value, RejectReason::ZeroQuantity)
            }
            None => resolution.reject(key, value, RejectReason::MalformedQuantity),
            Some(quantity) => resolution
                .lines
                .push(RequestedLine::new(item.clone(), quantity)),
        }
    }

    tracing::debug!(
        "Resolved {} order lines ({} fields dropped)",
        resolution.lines.len(),
        resolution.rejected.len()
    );
    resolution
}

#[derive(Debug, Default)]
struct AdhocRow<'a> {
    name: Option<&'a str>,
    price: Option<&'a str>,
    quantity: Option<&'a str>,
}

/// 自由輸入的訂單表單：每列由 `name_<n>`、`price_<n>`、`quantity_<n>` 組成，依 n 由小到大排列
pub fn resolve_adhoc_lines(form: &FormSubmission) -> Resolution {
    let mut rows: BTreeMap<u32, AdhocRow<'_>> = BTreeMap::new();

    for (key, value) in form.fields() {
        let (slot, index) = if let Some(index) = key.strip_prefix(NAME_PREFIX) {
            (0, index)
        } else if let Some(index) = key.strip_prefix(PRICE_PREFIX) {
            (1, index)
        } else if let Some(index) = key.strip_prefix(QUANTITY_PREFIX) {
            (2, index)
        } else {
            continue;
        };

        let Ok(index) = index.trim().parse::<u32>() else {
            continue;
        };

        let row = rows.entry(index).or_default();
        match slot {
            0 => row.name = Some(value),
            1 => row.price = Some(value),
            _ => row.quantity = Some(value),
        }
    }

    let mut resolution = Resolution::default();
    for (index, row) in rows {
        let key = format!("row_{}", index);
        let (Some(name), Some(price), Some(quantity)) = (row.name, row.price, row.quantity) else {
            resolution.reject(&key, "", RejectReason::MissingField);
            continue;
        };

        if name.trim().is_empty() {
            resolution.reject(&format!("{}{}", NAME_PREFIX, index), name, RejectReason::MissingField);
            continue;
        }

        let Ok(price) = Decimal::from_str(price.trim()) else {
            resolution.reject(
                &format!("{}{}", PRICE_PREFIX, index),
                price,
                RejectReason::MalformedPrice,
            );
            continue;
        };

        let quantity_value = coerce_quantity(quantity);
        if quantity_value == 0 {
            resolution.reject(
                &format!("{}{}", QUANTITY_PREFIX, index),
                quantity,
                RejectReason::ZeroQuantity,
            );
            continue;
        }

        let item = CatalogItem::new(index.to_string(), name.trim(), price, "custom");
        resolution.lines.push(RequestedLine::new(item, quantity_value));
    }

    resolution
}
