//! Stock Analysis Engine - runs pluggable passes over one gathered context

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::context::AnalysisContext;
use super::result::{PassReport, Recommendation};
use crate::error::{Result, StockError};
use crate::indicators::{compute_indicators, latest_snapshot};
use crate::model::Period;
use crate::service::StockDataService;

/// One independent analysis over the gathered context
#[async_trait]
pub trait AnalysisPass: Send + Sync {
    /// Name used in logs and warnings
    fn name(&self) -> &str;

    async fn analyze(&self, ctx: &AnalysisContext) -> Result<PassReport>;
}

/// Turns the successful pass reports into one recommendation
#[async_trait]
pub trait ReportSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        ctx: &AnalysisContext,
        reports: &[PassReport],
    ) -> Result<Recommendation>;
}

/// Stock Analysis Engine
pub struct StockAnalysisEngine {
    service: StockDataService,
    passes: Vec<Arc<dyn AnalysisPass>>,
    synthesizer: Arc<dyn ReportSynthesizer>,
}

impl StockAnalysisEngine {
    pub fn new(service: StockDataService, synthesizer: Arc<dyn ReportSynthesizer>) -> Self {
        Self {
            service,
            passes: Vec::new(),
            synthesizer,
        }
    }

    /// Register a pass; passes run in registration order
    pub fn with_pass(mut self, pass: Arc<dyn AnalysisPass>) -> Self {
        self.passes.push(pass);
        self
    }

    pub fn service(&self) -> &StockDataService {
        &self.service
    }

    /// Fetch quote info, enriched history and financials
    ///
    /// Fails when no usable history exists, since every pass reads the series.
    pub async fn gather_context(&self, ticker: &str, period: Period) -> Result<AnalysisContext> {
        let info = self.service.get_stock_info(ticker).await;
        let series = self.service.get_stock_data(ticker, period).await?;
        let enriched = compute_indicators(&series)?;
        let latest = latest_snapshot(&enriched)?;
        let financials = self.service.get_financial_data(ticker).await;

        Ok(AnalysisContext::new(info, period, enriched, latest, financials))
    }

    /// Gather the context, run every pass, then synthesize
    pub async fn analyze(&self, ticker: &str, period: Period) -> Result<Recommendation> {
        if self.passes.is_empty() {
            return Err(StockError::AnalysisError(
                "no analysis passes registered".to_string(),
            ));
        }

        let ctx = self.gather_context(ticker, period).await?;
        info!(symbol = ticker, passes = self.passes.len(), "Running analysis passes");

        let mut reports = Vec::with_capacity(self.passes.len());
        let mut warnings = Vec::new();
        for pass in &self.passes {
            match pass.analyze(&ctx).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    warn!(symbol = ticker, pass = pass.name(), error = %e, "Analysis pass failed");
                    warnings.push(format!("{} failed: {e}", pass.name()));
                },
            }
        }

        if reports.is_empty() {
            return Err(StockError::AnalysisError(format!(
                "every analysis pass failed for {ticker}"
            )));
        }

        let mut recommendation = self.synthesizer.synthesize(&ctx, &reports).await?;
        recommendation.passes = reports.iter().map(|r| r.pass.clone()).collect();
        for warning in warnings {
            recommendation.add_warning(warning);
        }

        info!(symbol = ticker, rating = %recommendation.rating, "Analysis complete");
        Ok(recommendation)
    }
}
