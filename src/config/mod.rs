pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::catalog::CatalogKind;
#[cfg(feature = "cli")]
use crate::core::form::FormSubmission;
#[cfg(feature = "cli")]
use crate::core::render::OutputFormat;
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::{OrderError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_SHOP_NAME: &str = "Kaito Shop";

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "order-calc")]
#[command(about = "Calculate storefront order totals with quantity, bulk and tax rules")]
pub struct CliConfig {
    /// Catalog CSV/JSON file or http(s) endpoint
    #[arg(long)]
    pub catalog: Option<String>,

    /// Catalog source type (csv, json, api); inferred from --catalog when omitted
    #[arg(long)]
    pub catalog_type: Option<String>,

    /// Form body, e.g. "quantity_1=3&quantity_4=5"
    #[arg(long)]
    pub form: Option<String>,

    /// Single form field as key=value (repeatable)
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Read name_<n>/price_<n>/quantity_<n> rows instead of catalog quantities
    #[arg(long)]
    pub adhoc: bool,

    #[arg(long, default_value = "text")]
    pub format: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "$")]
    pub currency_symbol: String,

    #[arg(long, default_value = DEFAULT_SHOP_NAME)]
    pub shop_name: String,

    /// Print the receipt instead of writing it to --output-path
    #[arg(long)]
    pub stdout: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn catalog_kind(&self) -> Result<CatalogKind> {
        let location = validation::validate_required_field("catalog", &self.catalog)?;
        match &self.catalog_type {
            Some(kind) => kind.parse(),
            None => CatalogKind::infer(location).ok_or_else(|| OrderError::InvalidConfigValueError {
                field: "catalog".to_string(),
                value: location.clone(),
                reason: "Cannot infer catalog type; pass --catalog-type".to_string(),
            }),
        }
    }

    /// 合併 --form 與 --field 成為一次表單提交
    pub fn submission(&self) -> Result<FormSubmission> {
        let mut submission = self
            .form
            .as_deref()
            .map(FormSubmission::from_urlencoded)
            .unwrap_or_default();

        for field in &self.fields {
            if !submission.push_assignment(field) {
                return Err(OrderError::InvalidConfigValueError {
                    field: "field".to_string(),
                    value: field.clone(),
                    reason: "Expected key=value".to_string(),
                });
            }
        }

        Ok(submission)
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn shop_name(&self) -> &str {
        &self.shop_name
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_format(&self) -> &str {
        &self.format
    }

    fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if !self.adhoc {
            let location = validation::validate_required_field("catalog", &self.catalog)?;
            match self.catalog_kind()? {
                CatalogKind::Api => validation::validate_url("catalog", location)?,
                _ => {
                    validation::validate_path("catalog", location)?;
                    if self.catalog_type.is_none() {
                        validation::validate_file_extension("catalog", location, &["csv", "json"])?;
                    }
                }
            }
        }

        validation::validate_one_of("format", &self.format, &OutputFormat::VARIANTS)?;
        validation::validate_non_empty_string("currency_symbol", &self.currency_symbol)?;
        validation::validate_non_empty_string("shop_name", &self.shop_name)?;
        if !self.stdout {
            validation::validate_path("output_path", &self.output_path)?;
        }
        self.submission()?;
        Ok(())
    }
}
