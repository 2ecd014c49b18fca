use anyhow::Result;
use order_calc::app::{checkout, CheckoutOutcome, CheckoutRequest};
use order_calc::utils::validation::Validate;
use order_calc::{FormSubmission, TomlConfig};
use tempfile::TempDir;

#[tokio::test]
async fn test_toml_driven_checkout_writes_html_receipt() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let temp_path = temp_dir.path().to_str().unwrap();

    std::fs::write(
        temp_dir.path().join("items.json"),
        r#"[
            {"id": 7, "name": "Nuts & Bolts", "price": "2.50", "type": "hardware"},
            {"id": 8, "name": "<Wiper>", "price": "15.00", "type": "wipers"}
        ]"#,
    )?;

    // 建立 TOML 配置
    let config_content = format!(
        r#"
[shop]
name = "Kaito's Parts"

[catalog]
path = "{0}/items.json"

[render]
format = "html"
currency_symbol = "$"

[output]
output_path = "{0}/receipts"

[logging]
level = "debug"
"#,
        temp_path
    );
    let config_path = temp_dir.path().join("order-config.toml");
    std::fs::write(&config_path, config_content)?;

    let config = TomlConfig::from_file(&config_path)?;
    config.validate()?;
    assert_eq!(config.log_level(), Some("debug"));

    let request = CheckoutRequest {
        catalog: Some((
            config.catalog_kind()?,
            config.catalog_location()?.to_string(),
        )),
        submission: FormSubmission::from_pairs([("quantity_7", "10"), ("quantity_8", "1")]),
        stdout: config.stdout(),
    };

    let outcome = checkout(&config, request).await?;
    assert_eq!(
        outcome,
        CheckoutOutcome::Saved(format!("{}/receipts/order_receipt.html", temp_path))
    );

    let html = std::fs::read_to_string(temp_dir.path().join("receipts/order_receipt.html"))?;

    assert!(html.contains("<h1>Kaito&#039;s Parts</h1>"));
    assert!(html.contains("<strong>Nuts &amp; Bolts</strong>"));
    assert!(html.contains("<strong>&lt;Wiper&gt;</strong>"));
    assert!(!html.contains("<Wiper>"));
    assert!(html.contains("10% OFF"));
    // 25.00 - 2.50 + 15.00 = 37.50，稅 4.50
    assert!(html.contains("<strong>$42.00</strong>"));
    assert!(!html.contains("Bulk Order Discount"));

    Ok(())
}

#[tokio::test]
async fn test_toml_stdout_json_with_env_endpoint_override() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let catalog_path = temp_dir.path().join("catalog.csv");
    std::fs::write(
        &catalog_path,
        "id,name,price,type,image_url\n1,Battery,120.00,electrical,\n",
    )?;

    std::env::set_var("ORDER_CALC_IT_CATALOG", catalog_path.to_str().unwrap());
    let config = TomlConfig::from_toml_str(
        r#"
[catalog]
type = "csv"
path = "${ORDER_CALC_IT_CATALOG}"

[render]
format = "json"

[output]
stdout = true
"#,
    )?;
    std::env::remove_var("ORDER_CALC_IT_CATALOG");
    config.validate()?;

    let request = CheckoutRequest {
        catalog: Some((
            config.catalog_kind()?,
            config.catalog_location()?.to_string(),
        )),
        submission: FormSubmission::from_urlencoded("quantity_1=5"),
        stdout: config.stdout(),
    };

    let CheckoutOutcome::Printed(json) = checkout(&config, request).await? else {
        panic!("expected receipt on stdout");
    };
    let receipt: serde_json::Value = serde_json::from_str(&json)?;

    // 600 → 品項折扣 60 → 540 → 整單折扣 27 → 513 → 稅 61.56
    assert_eq!(receipt["has_bulk_discount"], true);
    assert_eq!(receipt["items"][0]["has_discount"], true);
    assert_eq!(receipt["rejected"].as_array().map(Vec::len), Some(0));
    let final_total: rust_decimal::Decimal = receipt["final_total"].as_str().unwrap().parse()?;
    assert_eq!(final_total, rust_decimal::Decimal::new(57456, 2));

    Ok(())
}

#[test]
fn test_toml_config_rejects_unknown_format() {
    let config = TomlConfig::from_toml_str(
        r#"
[catalog]
path = "items.csv"

[render]
format = "pdf"
"#,
    )
    .unwrap();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("render.format"));
}
