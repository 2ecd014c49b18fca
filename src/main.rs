use clap::Parser;
use order_calc::app::{checkout, CheckoutOutcome, CheckoutRequest};
use order_calc::utils::{logger, validation::Validate};
use order_calc::CliConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger(config.verbose.then_some("debug"));
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting order-calc CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let request = CheckoutRequest {
        catalog: if config.adhoc {
            None
        } else {
            Some((config.catalog_kind()?, config.catalog.clone().unwrap_or_default()))
        },
        submission: config.submission()?,
        stdout: config.stdout,
    };

    match checkout(&config, request).await {
        Ok(CheckoutOutcome::Printed(receipt)) => {
            print!("{}", receipt);
        }
        Ok(CheckoutOutcome::Saved(output_path)) => {
            tracing::info!("✅ Order processed successfully!");
            println!("✅ Order processed successfully!");
            println!("📁 Receipt saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Order processing failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}
