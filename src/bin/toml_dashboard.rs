use clap::Parser;
use ticket_sales_etl::core::loader::parse_transactions;
use ticket_sales_etl::core::report::render_text;
use ticket_sales_etl::core::ConfigProvider;
use ticket_sales_etl::domain::model::ReportSettings;
use ticket_sales_etl::utils::{logger, validation::Validate};
use ticket_sales_etl::{DashboardPipeline, EtlEngine, LocalStorage, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-dashboard")]
#[command(about = "Ticket sales dashboard driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the report date from config (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<chrono::NaiveDate>,

    /// Dry run - validate the sales file without writing the report
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose || config.verbose());
    }

    tracing::info!("🚀 Starting TOML-based ticket sales dashboard");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(as_of) = args.as_of {
        config.summary.as_of = Some(as_of);
        tracing::info!("🔧 Report date overridden to: {}", as_of);
    }
    config.resolve_as_of(chrono::Local::now().date_naive());

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let settings = config.report_settings()?;
    display_config_summary(&config, &settings, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No report will be written");
        return perform_dry_run(&config);
    }

    let pipeline = DashboardPipeline::new(LocalStorage::default(), config);
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            println!("{}", render_text(&outcome.report));
            if let Some(path) = outcome.output_path {
                tracing::info!("✅ Dashboard report completed");
                println!("📁 Report saved to: {}", path);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Dashboard run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = e.severity().exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, settings: &ReportSettings, args: &Args) {

    println!("📋 Configuration Summary:");
    println!("  Dashboard: {}", config.dashboard.name);
    if let Some(description) = &config.dashboard.description {
        println!("  Description: {}", description);
    }
    println!("  Source: {}", config.source.path);
    println!("  Output: {}", config.output_path());
    println!("  Export: {}", config.export_enabled());
    println!("  Windows: {:?} days", settings.windows);
    println!("  Blocks: {} x {} days", settings.block_count, settings.block_days);
    println!("  Period: {}", settings.period.name());
    println!("  As of: {}", settings.as_of.date());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    println!("🔍 Dry Run Analysis:");

    let bytes = std::fs::read(&config.source.path)
        .with_context(|| format!("reading sales file {}", config.source.path))?;
    let dataset = parse_transactions(&bytes)?;

    println!("  Transactions: {}", dataset.len());
    if let (Some(first), Some(last)) = (dataset.min_payment_date(), dataset.max_payment_date()) {
        println!("  Payments from {} to {}", first, last);
    }
    println!("  Total sales: {:.2}", dataset.total_sales());

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
