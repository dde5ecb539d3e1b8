use clap::Parser;
use pgx_guard::domain::rules::{PhenotypeTable, RiskResolver};
use pgx_guard::utils::{logger, validation::Validate};
use pgx_guard::{CliConfig, LocalStorage, ScreenEngine, ScreenPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting pgx-guard CLI");
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

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 載入表型對照表（預設內建，可用外部 JSON 覆蓋）
    let phenotypes = match &config.phenotypes {
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
    let storage = LocalStorage::new(config.output_path.clone());
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
