use crate::core::{CatalogItem, CatalogSource, Storage};
use crate::utils::error::{OrderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

/// 唯讀商品目錄，依 (type, name) 排序並可用 id 查詢
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<CatalogItem>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        let mut seen = HashSet::new();
        let mut items: Vec<CatalogItem> = items
            .into_iter()
            .filter(|item| {
                let first = seen.insert(item.id.clone());
                if !first {
                    tracing::warn!("Duplicate catalog id '{}', keeping the first record", item.id);
                }
                first
            })
            .collect();

        // 先依類型再依名稱，與商品頁的分組顯示一致
        items.sort_by(|a, b| {
            a.item_type
                .cmp(&b.item_type)
                .then_with(|| a.name.cmp(&b.name))
        });

        let index = items
            .iter()
            .enumerate()
            .map(|(position, item)| (item.id.clone(), position))
            .collect();

        Self { items, index }
    }

    pub fn get(&self, id: &str) -> Option<&CatalogItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn by_type(&self) -> BTreeMap<&str, Vec<&CatalogItem>> {
        let mut groups: BTreeMap<&str, Vec<&CatalogItem>> = BTreeMap::new();
        for item in &self.items {
            groups.entry(item.item_type.as_str()).or_default().push(item);
        }
        groups
    }

    pub async fn load_from<C: CatalogSource + ?Sized>(source: &C) -> Result<Self> {
        tracing::debug!("Loading catalog from {}", source.describe());
        let items = source.load().await?;
        let catalog = Self::new(items);
        tracing::info!("📦 Loaded {} catalog items", catalog.len());
        Ok(catalog)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: String,
    name: String,
    price: String,
    #[serde(rename = "type", default)]
    item_type: String,
    #[serde(default)]
    image_url: Option<String>,
}

impl CatalogRow {
    fn into_item(self) -> Option<CatalogItem> {
        match Decimal::from_str(self.price.trim()) {
            Ok(price) => Some(CatalogItem {
                id: self.id.trim().to_string(),
                name: self.name,
                price,
                item_type: self.item_type,
                image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            }),
            Err(e) => {
                tracing::warn!(
                    "Skipping catalog row '{}': invalid price '{}' ({})",
                    self.id,
                    self.price,
                    e
                );
                None
            }
        }
    }
}

/// 解析 CSV 目錄內容，表頭為 id,name,price,type,image_url
pub fn parse_csv_catalog(data: &[u8]) -> Result<Vec<CatalogItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(data);

    let mut items = Vec::new();
    for row in reader.deserialize::<CatalogRow>() {
        if let Some(item) = row?.into_item() {
            items.push(item);
        }
    }
    Ok(items)
}

pub fn parse_json_catalog(data: &[u8]) -> Result<Vec<CatalogItem>> {
    let items: Vec<CatalogItem> = serde_json::from_slice(data)?;
    Ok(items)
}

pub struct CsvCatalog<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> CsvCatalog<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

#[async_trait]
impl<S: Storage> CatalogSource for CsvCatalog<S> {
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        let data = self.storage.read_file(&self.path).await?;
        parse_csv_catalog(&data)
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path)
    }
}

pub struct JsonCatalog<S: Storage> {
    storage: S,
    path: String,
}

impl<S: Storage> JsonCatalog<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
        }
    }
}

#[async_trait]
impl<S: Storage> CatalogSource for JsonCatalog<S> {
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        let data = self.storage.read_file(&self.path).await?;
        parse_json_catalog(&data)
    }

    fn describe(&self) -> String {
        format!("JSON file {}", self.path)
    }
}

pub struct ApiCatalog {
    endpoint: String,
    client: Client,
}

impl ApiCatalog {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl CatalogSource for ApiCatalog {
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        tracing::debug!("Making catalog request to: {}", self.endpoint);
        let response = self.client.get(&self.endpoint).send().await?;

        tracing::debug!("Catalog response status: {}", response.status());
        if !response.status().is_success() {
            return Err(OrderError::catalog(format!(
                "catalog endpoint {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        parse_json_catalog(&bytes)
    }

    fn describe(&self) -> String {
        format!("API {}", self.endpoint)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
}

impl StaticCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        Ok(self.items.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory items", self.items.len())
    }
}

#[async_trait]
impl<T: CatalogSource + ?Sized> CatalogSource for Box<T> {
    async fn load(&self) -> Result<Vec<CatalogItem>> {
        (**self).load().await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Csv,
    Json,
    Api,
}

impl CatalogKind {
    pub const VARIANTS: [&'static str; 3] = ["csv", "json", "api"];

    /// 由位置推斷來源類型：http(s) 網址為 API，其餘看副檔名
    pub fn infer(location: &str) -> Option<Self> {
        let lowered = location.trim().to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Some(CatalogKind::Api)
        } else if lowered.ends_with(".csv") {
            Some(CatalogKind::Csv)
        } else if lowered.ends_with(".json") {
            Some(CatalogKind::Json)
        } else {
            None
        }
    }
}

impl FromStr for CatalogKind {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(CatalogKind::Csv),
            "json" => Ok(CatalogKind::Json),
            "api" | "http" => Ok(CatalogKind::Api),
            other => Err(OrderError::InvalidConfigValueError {
                field: "catalog.type".to_string(),
                value: other.to_string(),
                reason: format!("Valid catalog types: {}", Self::VARIANTS.join(", ")),
            }),
        }
    }
}

pub fn catalog_source<S: Storage + 'static>(
    kind: CatalogKind,
    location: &str,
    storage: S,
) -> Box<dyn CatalogSource> {
    match kind {
        CatalogKind::Csv => Box::new(CsvCatalog::new(storage, location)),
        CatalogKind::Json => Box::new(JsonCatalog::new(storage, location)),
        CatalogKind::Api => Box::new(ApiCatalog::new(location)),
    }
}
