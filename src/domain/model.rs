use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// 商品目錄中的單一品項，訂單處理期間不可變
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CatalogItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        item_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            item_type: item_type.into(),
            image_url: None,
        }
    }

    pub fn with_image(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }
}

// 資料庫匯出的 id 可能是數字
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id.trim().to_string(),
        RawId::Number(id) => id.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedLine {
    pub item: CatalogItem,
    pub quantity: u32,
}

impl RequestedLine {
    pub fn new(item: CatalogItem, quantity: u32) -> Self {
        Self { item, quantity }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineResult {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    /// price × quantity，尚未扣除品項折扣
    pub line_total: Decimal,
    /// 扣除品項折扣後的小計
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub has_discount: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderResult {
    pub items: Vec<LineResult>,
    /// 品項折扣後、整單折扣前的小計
    pub subtotal: Decimal,
    pub item_discounts: Decimal,
    pub bulk_discount: Decimal,
    /// 兩層折扣都扣除後的小計，稅額以此計算
    pub final_subtotal: Decimal,
    pub tax: Decimal,
    pub final_total: Decimal,
    pub has_bulk_discount: bool,
}

impl OrderResult {
    pub fn total_discounts(&self) -> Decimal {
        self.item_discounts + self.bulk_discount
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}
