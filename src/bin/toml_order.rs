use clap::Parser;
use order_calc::app::{checkout, CheckoutOutcome, CheckoutRequest};
use order_calc::config::toml_config::TomlConfig;
use order_calc::core::catalog::{catalog_source, Catalog};
use order_calc::core::form::FormSubmission;
use order_calc::utils::{logger, validation::Validate};
use order_calc::LocalStorage;

#[derive(Parser)]
#[command(name = "toml-order")]
#[command(about = "Order calculator with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "order-config.toml")]
    config: String,

    /// Form body, e.g. "quantity_1=3&quantity_4=5"
    #[arg(long)]
    form: Option<String>,

    /// Single form field as key=value (repeatable)
    #[arg(long = "field")]
    fields: Vec<String>,

    /// Read name_<n>/price_<n>/quantity_<n> rows instead of catalog quantities
    #[arg(long)]
    adhoc: bool,

    /// Override render.format from config
    #[arg(long)]
    format: Option<String>,

    /// Override output.stdout from config
    #[arg(long)]
    stdout: Option<bool>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dry run - show the configuration and catalog without calculating
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置（日誌設定也在裡面，所以先載入）
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if config.json_logs() {
        logger::init_json_logger(if args.verbose {
            Some("debug")
        } else {
            config.log_level()
        });
    } else {
        logger::init_cli_logger(args.verbose || config.log_level() == Some("debug"));
    }

    tracing::info!("🚀 Starting TOML-based order calculator");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(format) = &args.format {
        config.render.format = format.clone();
        tracing::info!("🔧 Output format overridden to: {}", format);
    }
    if let Some(stdout) = args.stdout {
        config.output.stdout = Some(stdout);
    }

    // 自由輸入模式不需要商品目錄，只驗證輸出設定
    let validation = if args.adhoc {
        order_calc::EngineSettings::from_config(&config).map(|_| ())
    } else {
        config.validate()
    };
    if let Err(e) = validation {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let submission = build_submission(&args)?;
    display_config_summary(&config, &args, &submission);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No receipt will be written");
        perform_dry_run(&config, &args).await?;
        return Ok(());
    }

    let request = CheckoutRequest {
        catalog: if args.adhoc {
            None
        } else {
            Some((
                config.catalog_kind()?,
                config.catalog_location()?.to_string(),
            ))
        },
        submission,
        stdout: config.stdout(),
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

fn build_submission(args: &Args) -> anyhow::Result<FormSubmission> {
    let mut submission = args
        .form
        .as_deref()
        .map(FormSubmission::from_urlencoded)
        .unwrap_or_default();

    for field in &args.fields {
        if !submission.push_assignment(field) {
            anyhow::bail!("invalid --field '{}': expected key=value", field);
        }
    }
    Ok(submission)
}

fn display_config_summary(config: &TomlConfig, args: &Args, submission: &FormSubmission) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("  Shop: {}", config.shop.name);
    if args.adhoc {
        tracing::info!("  Catalog: (ad-hoc rows)");
    } else if let Ok(location) = config.catalog_location() {
        tracing::info!("  Catalog: {}", location);
    }
    tracing::info!(
        "  Render: {} ({})",
        config.render.format,
        config.render.currency_symbol
    );
    if config.stdout() {
        tracing::info!("  Output: stdout");
    } else {
        tracing::info!("  Output: {}", config.output.output_path);
    }
    tracing::info!("  Form fields: {}", submission.len());
}

async fn perform_dry_run(config: &TomlConfig, args: &Args) -> anyhow::Result<()> {
    if args.adhoc {
        println!("🔍 Dry run: ad-hoc mode, no catalog to load");
        return Ok(());
    }

    let source = catalog_source(
        config.catalog_kind()?,
        config.catalog_location()?,
        LocalStorage::new("."),
    );
    let catalog = Catalog::load_from(&source).await?;

    println!("🔍 Dry run: {} catalog items", catalog.len());
    for (item_type, items) in catalog.by_type() {
        println!("  [{}]", item_type);
        for item in items {
            println!("    quantity_{} - {} ({})", item.id, item.name, item.price);
        }
    }
    Ok(())
}
