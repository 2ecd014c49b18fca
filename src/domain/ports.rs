use crate::domain::model::CatalogItem;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn shop_name(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_format(&self) -> &str;
    fn currency_symbol(&self) -> &str;
}

/// 商品目錄來源（CSV、JSON、HTTP API 或記憶體）
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Vec<CatalogItem>>;

    fn describe(&self) -> String;
}
