use clap::Parser;
use pgx_guard::config::toml_config::TomlConfig;
use pgx_guard::core::ConfigProvider;
use pgx_guard::domain::rules::{PhenotypeTable, RiskResolver, RuleSet};
use pgx_guard::utils::{logger, validation::Validate};
use pgx_guard::LocalStorage;
use pgx_guard::{ScreenEngine, ScreenPipeline};

#[derive(Parser)]
#[command(name = "toml-screen")]
#[command(about = "Drug-risk screening driven by a TOML panel configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "pgx-screen.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Force template explanations, skipping the API
    #[arg(long)]
    no_explain: bool,

    /// Dry run - show what would be screened without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based screening tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    // 載入 TOML 配置
    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 應用命令列覆蓋設定
    if args.no_explain {
        if let Some(explanation) = config.explanation.as_mut() {
            explanation.enabled = Some(false);
        } else {
            config.explanation = Some(pgx_guard::config::toml_config::ExplanationConfig {
                enabled: Some(false),
                endpoint: None,
                model: None,
                api_key: None,
                timeout_seconds: None,
            });
        }
        tracing::info!("🔧 Explanation API disabled from command line");
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    // 顯示配置摘要
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual screening will occur");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 載入表型對照表
    let phenotypes = match config.phenotype_table() {
        Some(path) => match PhenotypeTable::from_file(path) {
            Ok(table) => {
                tracing::info!("📋 Loaded phenotype table from {} ({} genes)", path, table.gene_count());
                table
            }
            Err(e) => {
                tracing::error!("❌ Failed to load phenotype table: {}", e);
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(1);
            }
        },
        None => PhenotypeTable::builtin(),
    };

    // 創建存儲和管道
    let storage = LocalStorage::new(config.output_path().to_string());
    let resolver = RiskResolver::with_builtin_rules(phenotypes);
    let pipeline = ScreenPipeline::new(storage, config, resolver);

    // 創建篩查引擎並運行
    let engine = ScreenEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Screening completed successfully!");
            tracing::info!("📁 Report saved to: {}", output_path);
            println!("✅ Screening completed successfully!");
            println!("📁 Report saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Screening failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                pgx_guard::utils::error::ErrorSeverity::Low => 0, // 警告，但成功
                pgx_guard::utils::error::ErrorSeverity::Medium => 2, // 重試錯誤
                pgx_guard::utils::error::ErrorSeverity::High => 1, // 處理錯誤
                pgx_guard::utils::error::ErrorSeverity::Critical => 3, // 系統錯誤
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Panel: {}", config.screening.name);

    if let Some(description) = &config.screening.description {
        println!("  Description: {}", description);
    }

    println!("  VCF: {}", config.input.vcf);
    println!("  Drugs: {}", config.screening.drugs.join(", "));
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.report.output_formats.join(", "));

    if let Some(table) = config.phenotype_table() {
        println!("  Phenotype Table: {}", table);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    // 輸入分析
    println!("🧬 Input Analysis:");
    println!("  VCF: {}", config.input.vcf);
    match std::fs::metadata(&config.input.vcf) {
        Ok(meta) => println!("  File exists: yes ({} bytes)", meta.len()),
        Err(_) => println!("  File exists: ⚠️ NO - screening would fail"),
    }

    if let Some(table) = config.phenotype_table() {
        println!("  Phenotype table: {}", table);
    } else {
        println!("  Phenotype table: built-in");
    }

    // 藥物規則分析
    println!();
    println!("💊 Drug Coverage:");
    let rules = RuleSet::builtin();
    for drug in &config.screening.drugs {
        match rules.get(drug) {
            Some(rule) => println!("  {} -> requires {}", drug, rule.genes.join(", ")),
            None => println!("  {} -> ⚠️ unknown drug, will report zero confidence", drug),
        }
    }

    // 解釋服務分析
    println!();
    println!("🤖 Explanation Service:");
    let settings = config.explain_settings();
    if settings.enabled {
        println!("  Endpoint: {}", settings.endpoint);
        println!("  Model: {}", settings.model);
        println!(
            "  API key: {}",
            if settings.api_key.is_some() {
                "configured"
            } else {
                "⚠️ missing, will fall back to template text"
            }
        );
    } else {
        println!("  Disabled - template text will be used");
    }

    // 輸出分析
    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.report.output_formats.join(", "));

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
