use httpmock::prelude::*;
use order_calc::app::{checkout, CheckoutOutcome, CheckoutRequest};
use order_calc::core::catalog::CatalogKind;
use order_calc::{CliConfig, FormSubmission, OrderError};
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

fn cli_config(output_path: &str, format: &str) -> CliConfig {
    CliConfig {
        catalog: None,
        catalog_type: None,
        form: None,
        fields: vec![],
        adhoc: false,
        format: format.to_string(),
        output_path: output_path.to_string(),
        currency_symbol: "$".to_string(),
        shop_name: "Kaito Shop".to_string(),
        stdout: false,
        verbose: false,
        json_logs: false,
    }
}

fn decimal_field(value: &serde_json::Value, field: &str) -> Decimal {
    Decimal::from_str(value[field].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_end_to_end_checkout_with_csv_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("items.csv");
    std::fs::write(
        &catalog_path,
        "id,name,price,type,image_url\n\
         1,Brake Pad,45.50,brakes,\n\
         2,Spark Plug,8.25,ignition,\n\
         3,Oil Filter,12.00,filters,\n",
    )
    .unwrap();

    let output_path = temp_dir.path().join("receipts");
    let output_path = output_path.to_str().unwrap().to_string();
    let config = cli_config(&output_path, "text");

    let request = CheckoutRequest {
        catalog: Some((CatalogKind::Csv, catalog_path.to_str().unwrap().to_string())),
        submission: FormSubmission::from_urlencoded(
            "quantity_1=5&quantity_2=2&quantity_3=0&quantity_42=1",
        ),
        stdout: false,
    };

    let outcome = checkout(&config, request).await.unwrap();
    let CheckoutOutcome::Saved(saved_path) = outcome else {
        panic!("expected receipt to be written to disk");
    };
    assert!(saved_path.ends_with("order_receipt.txt"));

    // 驗證輸出檔案內容
    let receipt = std::fs::read_to_string(
        std::path::Path::new(&output_path).join("order_receipt.txt"),
    )
    .unwrap();

    assert!(receipt.starts_with("Kaito Shop\n"));
    assert!(receipt.contains("Order processed on: "));
    assert!(receipt.contains("  Brake Pad: 5 x $45.50 = $227.50 (10% OFF -$22.75)"));
    assert!(receipt.contains("  Spark Plug: 2 x $8.25 = $16.50\n"));
    assert!(!receipt.contains("Oil Filter:"));
    assert!(receipt.contains("Total Quantity Discounts: -$22.75"));
    assert!(receipt.contains("Subtotal (after item discounts): $221.25"));
    assert!(receipt.contains("Bulk Discount (5%): $0.00"));
    assert!(receipt.contains("Tax (12%): $26.55"));
    assert!(receipt.contains("Final Total: $247.80"));

    assert!(receipt.contains("Skipped fields:"));
    assert!(receipt.contains("quantity_3=\"0\": quantity is zero"));
    assert!(receipt.contains("quantity_42=\"1\": no catalog item with this id"));

    let brake_pad_position = receipt.find("Brake Pad:").unwrap();
    let spark_plug_position = receipt.find("Spark Plug:").unwrap();
    assert!(brake_pad_position < spark_plug_position);
}

#[tokio::test]
async fn test_checkout_with_api_catalog_and_bulk_discount() {
    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET).path("/items");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([
                {"id": 1, "name": "Rotor", "price": "100.00", "type": "brakes"},
                {"id": 2, "name": "Brake Fluid", "price": 12.5, "type": "fluids"}
            ]));
    });

    let temp_dir = TempDir::new().unwrap();
    let config = cli_config(temp_dir.path().to_str().unwrap(), "json");

    let request = CheckoutRequest {
        catalog: Some((CatalogKind::Api, server.url("/items"))),
        submission: FormSubmission::from_pairs([("quantity_1", "6")]),
        stdout: true,
    };

    let outcome = checkout(&config, request).await.unwrap();
    catalog_mock.assert();

    let CheckoutOutcome::Printed(json) = outcome else {
        panic!("expected receipt on stdout");
    };
    let receipt: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(receipt["shop_name"], "Kaito Shop");
    assert_eq!(receipt["has_bulk_discount"], true);
    assert_eq!(receipt["items"].as_array().unwrap().len(), 1);
    assert_eq!(decimal_field(&receipt, "subtotal"), Decimal::from(540));
    assert_eq!(decimal_field(&receipt, "bulk_discount"), Decimal::from(27));
    assert_eq!(decimal_field(&receipt, "final_subtotal"), Decimal::from(513));
    assert_eq!(decimal_field(&receipt, "tax"), Decimal::new(6156, 2));
    assert_eq!(decimal_field(&receipt, "final_total"), Decimal::new(57456, 2));
    assert_eq!(decimal_field(&receipt, "total_discounts"), Decimal::from(87));

    // stdout 模式不寫檔
    assert!(!temp_dir.path().join("order_receipt.json").exists());
}

#[tokio::test]
async fn test_api_catalog_error_status_is_catalog_error() {
    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET).path("/items");
        then.status(500).body("database unavailable");
    });

    let temp_dir = TempDir::new().unwrap();
    let config = cli_config(temp_dir.path().to_str().unwrap(), "text");

    let request = CheckoutRequest {
        catalog: Some((CatalogKind::Api, server.url("/items"))),
        submission: FormSubmission::from_pairs([("quantity_1", "1")]),
        stdout: false,
    };

    let result = checkout(&config, request).await;
    catalog_mock.assert();

    let error = result.unwrap_err();
    assert!(matches!(error, OrderError::CatalogError { .. }));
    assert_eq!(error.exit_code(), 1);
    assert!(!temp_dir.path().join("order_receipt.txt").exists());
}

#[tokio::test]
async fn test_adhoc_checkout_without_catalog() {
    let temp_dir = TempDir::new().unwrap();
    let config = cli_config(temp_dir.path().to_str().unwrap(), "text");

    let request = CheckoutRequest {
        catalog: None,
        submission: FormSubmission::from_urlencoded(
            "name_0=Tire&price_0=50&quantity_0=4&name_1=Mirror&price_1=&quantity_1=2",
        ),
        stdout: true,
    };

    let CheckoutOutcome::Printed(receipt) = checkout(&config, request).await.unwrap() else {
        panic!("expected receipt on stdout");
    };

    assert!(receipt.contains("  Tire: 4 x $50.00 = $200.00\n"));
    assert!(receipt.contains("Tax (12%): $24.00"));
    assert!(receipt.contains("Final Total: $224.00"));
    assert!(receipt.contains("price_1=\"\": price is not a decimal number"));
}

#[tokio::test]
async fn test_empty_submission_renders_empty_receipt() {
    let temp_dir = TempDir::new().unwrap();
    let catalog_path = temp_dir.path().join("items.json");
    std::fs::write(
        &catalog_path,
        r#"[{"id": "1", "name": "Rotor", "price": 80, "type": "brakes"}]"#,
    )
    .unwrap();

    let config = cli_config(temp_dir.path().to_str().unwrap(), "html");
    let request = CheckoutRequest {
        catalog: Some((CatalogKind::Json, catalog_path.to_str().unwrap().to_string())),
        submission: FormSubmission::new(),
        stdout: true,
    };

    let CheckoutOutcome::Printed(html) = checkout(&config, request).await.unwrap() else {
        panic!("expected receipt on stdout");
    };

    assert!(html.contains("No valid items"));
    assert!(html.contains("<strong>$0.00</strong>"));
    assert!(!html.contains("Bulk Order Discount"));
}

#[tokio::test]
async fn test_missing_catalog_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = cli_config(temp_dir.path().to_str().unwrap(), "text");

    let request = CheckoutRequest {
        catalog: Some((
            CatalogKind::Csv,
            temp_dir.path().join("missing.csv").to_str().unwrap().to_string(),
        )),
        submission: FormSubmission::from_pairs([("quantity_1", "1")]),
        stdout: false,
    };

    let error = checkout(&config, request).await.unwrap_err();
    assert!(matches!(error, OrderError::IoError(_)));
}
