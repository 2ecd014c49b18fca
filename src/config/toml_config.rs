use crate::config::DEFAULT_SHOP_NAME;
use crate::core::catalog::CatalogKind;
use crate::core::render::{OutputFormat, DEFAULT_CURRENCY_SYMBOL};
use crate::core::ConfigProvider;
use crate::utils::error::{OrderError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub shop: ShopConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub name: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SHOP_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub r#type: Option<String>,
    pub path: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub format: String,
    pub currency_symbol: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_path: String,
    pub stdout: Option<bool>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: "./output".to_string(),
            stdout: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(OrderError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| OrderError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CATALOG_URL})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| OrderError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 決定目錄來源類型：明確指定優先，否則由 endpoint 或 path 推斷
    pub fn catalog_kind(&self) -> Result<CatalogKind> {
        if let Some(kind) = &self.catalog.r#type {
            return kind.parse();
        }
        if self.catalog.endpoint.is_some() {
            return Ok(CatalogKind::Api);
        }

        let path = validation::validate_required_field("catalog.path", &self.catalog.path)?;
        CatalogKind::infer(path).ok_or_else(|| OrderError::InvalidConfigValueError {
            field: "catalog.path".to_string(),
            value: path.clone(),
            reason: "Cannot infer catalog type; set catalog.type".to_string(),
        })
    }

    pub fn catalog_location(&self) -> Result<&str> {
        let location = match self.catalog_kind()? {
            CatalogKind::Api => {
                validation::validate_required_field("catalog.endpoint", &self.catalog.endpoint)?
            }
            _ => validation::validate_required_field("catalog.path", &self.catalog.path)?,
        };
        Ok(location.as_str())
    }

    pub fn stdout(&self) -> bool {
        self.output.stdout.unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("shop.name", &self.shop.name)?;

        let location = self.catalog_location()?;
        match self.catalog_kind()? {
            CatalogKind::Api => validation::validate_url("catalog.endpoint", location)?,
            _ => validation::validate_path("catalog.path", location)?,
        }

        validation::validate_one_of("render.format", &self.render.format, &OutputFormat::VARIANTS)?;
        validation::validate_non_empty_string("render.currency_symbol", &self.render.currency_symbol)?;

        if !self.stdout() {
            validation::validate_path("output.output_path", &self.output.output_path)?;
        }

        if let Some(level) = self.log_level() {
            validation::validate_one_of(
                "logging.level",
                level,
                &["trace", "debug", "info", "warn", "error"],
            )?;
        }

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn shop_name(&self) -> &str {
        &self.shop.name
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn output_format(&self) -> &str {
        &self.render.format
    }

    fn currency_symbol(&self) -> &str {
        &self.render.currency_symbol
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
