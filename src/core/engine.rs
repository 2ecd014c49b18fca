use crate::core::calculator::calculate;
use crate::core::catalog::Catalog;
use crate::core::form::{resolve_adhoc_lines, resolve_catalog_lines, FormSubmission, Resolution};
use crate::core::render::{render, OrderReceipt, OutputFormat, RenderOptions};
use crate::core::{CatalogSource, ConfigProvider, Storage};
use crate::utils::error::Result;
use chrono::Utc;

pub const RECEIPT_FILE_STEM: &str = "order_receipt";

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub shop_name: String,
    pub output_path: String,
    pub format: OutputFormat,
    pub render: RenderOptions,
}

impl EngineSettings {
    pub fn from_config<P: ConfigProvider>(config: &P) -> Result<Self> {
        Ok(Self {
            shop_name: config.shop_name().to_string(),
            output_path: config.output_path().to_string(),
            format: config.output_format().parse()?,
            render: RenderOptions {
                currency_symbol: config.currency_symbol().to_string(),
            },
        })
    }

    pub fn receipt_filename(&self) -> String {
        format!("{}.{}", RECEIPT_FILE_STEM, self.format.extension())
    }
}

/// 一次表單提交的流程：載入目錄 → 解析表單 → 計算 → 輸出
pub struct OrderEngine<C: CatalogSource, S: Storage> {
    catalog_source: C,
    storage: S,
    settings: EngineSettings,
}

impl<C: CatalogSource, S: Storage> OrderEngine<C, S> {
    pub fn new(catalog_source: C, storage: S, settings: EngineSettings) -> Self {
        Self {
            catalog_source,
            storage,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn load_catalog(&self) -> Result<Catalog> {
        Catalog::load_from(&self.catalog_source).await
    }

    pub async fn process(&self, form: &FormSubmission) -> Result<OrderReceipt> {
        tracing::info!("Loading catalog...");
        let catalog = self.load_catalog().await?;

        tracing::info!("Resolving {} form fields...", form.len());
        let resolution = resolve_catalog_lines(form, &catalog);
        Ok(self.build_receipt(resolution))
    }

    /// 不經商品目錄，直接使用表單中的名稱與單價
    pub fn process_adhoc(&self, form: &FormSubmission) -> OrderReceipt {
        tracing::info!("Resolving {} ad-hoc form fields...", form.len());
        self.build_receipt(resolve_adhoc_lines(form))
    }

    pub fn render(&self, receipt: &OrderReceipt) -> Result<String> {
        render(receipt, self.settings.format, &self.settings.render)
    }

    pub async fn run(&self, form: &FormSubmission) -> Result<String> {
        let receipt = self.process(form).await?;
        self.write_receipt(&receipt).await
    }

    pub async fn run_adhoc(&self, form: &FormSubmission) -> Result<String> {
        let receipt = self.process_adhoc(form);
        self.write_receipt(&receipt).await
    }

    pub async fn write_receipt(&self, receipt: &OrderReceipt) -> Result<String> {
        tracing::info!("Rendering receipt as {:?}...", self.settings.format);
        let rendered = self.render(receipt)?;

        let filename = self.settings.receipt_filename();
        tracing::debug!("Writing receipt ({} bytes) to storage", rendered.len());
        self.storage.write_file(&filename, rendered.as_bytes()).await?;

        let output_path = format!("{}/{}", self.settings.output_path, filename);
        tracing::info!("Receipt saved to: {}", output_path);
        Ok(output_path)
    }

    fn build_receipt(&self, resolution: Resolution) -> OrderReceipt {
        if !resolution.rejected.is_empty() {
            tracing::warn!(
                "⚠️ {} form fields were dropped before calculation",
                resolution.rejected.len()
            );
        }

        tracing::info!("Calculating {} order lines...", resolution.lines.len());
        let order = calculate(&resolution.lines);
        tracing::info!(
            "Order total: {} ({} items)",
            order.final_total,
            order.item_count()
        );

        OrderReceipt {
            shop_name: self.settings.shop_name.clone(),
            processed_at: Utc::now(),
            order,
            rejected: resolution.rejected,
        }
    }
}
