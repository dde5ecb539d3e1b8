use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct ScreenEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ScreenEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting screening process...");

        // Extract
        tracing::info!("Extracting variants...");
        let variants = self.pipeline.extract().await?;
        tracing::info!("Extracted {} variant records", variants.len());
        self.monitor.log_stats("Extract");

        // Evaluate
        tracing::info!("Evaluating drug risks...");
        let summary = self.pipeline.evaluate(variants).await?;
        tracing::info!("Evaluated {} drug(s)", summary.screens.len());
        self.monitor.log_stats("Evaluate");

        // Load
        tracing::info!("Writing report bundle...");
        let output_path = self.pipeline.load(summary).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
