// Application layer: wires a config provider to the order engine for the binaries.

use crate::config::cli::LocalStorage;
use crate::core::catalog::{catalog_source, CatalogKind, StaticCatalog};
use crate::core::engine::{EngineSettings, OrderEngine};
use crate::core::form::FormSubmission;
use crate::core::{CatalogSource, ConfigProvider};
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// None 代表自由輸入模式（不需要商品目錄）
    pub catalog: Option<(CatalogKind, String)>,
    pub submission: FormSubmission,
    pub stdout: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Printed(String),
    Saved(String),
}

pub async fn checkout<P: ConfigProvider>(config: &P, request: CheckoutRequest) -> Result<CheckoutOutcome> {
    let settings = EngineSettings::from_config(config)?;
    let storage = LocalStorage::new(settings.output_path.clone());

    let source: Box<dyn CatalogSource> = match &request.catalog {
        Some((kind, location)) => catalog_source(*kind, location, LocalStorage::new(".")),
        None => Box::new(StaticCatalog::default()),
    };
    let engine = OrderEngine::new(source, storage, settings);

    let receipt = match request.catalog {
        Some(_) => engine.process(&request.submission).await?,
        None => engine.process_adhoc(&request.submission),
    };

    if request.stdout {
        return Ok(CheckoutOutcome::Printed(engine.render(&receipt)?));
    }

    let output_path = engine.write_receipt(&receipt).await?;
    Ok(CheckoutOutcome::Saved(output_path))
}
