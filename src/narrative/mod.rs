//! Boundary to the external narrative-generation service. The engine sends
//! only bounded scalar facts and treats any failure as recoverable: the
//! caller falls back to [`fallback_summary`], a pure template over the same
//! facts.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Analysis, NO_ALERTS, OutputBounds, Profile, Scenario};

/// Connection settings for the narrative service.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

/// Bounded scalar facts handed to the narrative service. Every numeric
/// field has passed through [`OutputBounds`], so the prompt can never carry
/// unbounded or adversarial values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeFacts {
    pub income_monthly: f64,
    pub expenses_monthly: f64,
    pub savings: f64,
    pub debt: f64,
    pub dependents: u32,
    pub industry: String,
    pub stability_label: &'static str,
    pub stability_weight: f64,
    pub months_unemployed: u32,
    pub expense_cut_pct: f64,
    pub severance: f64,
    pub monthly_expenses_cut: f64,
    pub monthly_net_burn: f64,
    pub monthly_support: f64,
    pub one_time_expense: f64,
    pub runway_months: u32,
    pub debt_ratio: f64,
    pub risk_score: f64,
    pub adjusted_risk_score: f64,
    pub savings_total: f64,
    pub months_until_zero: u32,
    pub max_drawdown: f64,
    pub trend_slope: f64,
    pub alert: String,
}

impl NarrativeFacts {
    pub fn collect(
        profile: &Profile,
        scenario: &Scenario,
        analysis: &Analysis,
        savings_total: f64,
    ) -> Self {
        let bounds = OutputBounds::default();
        let metrics = &analysis.metrics;
        let stats = &analysis.stats;

        Self {
            income_monthly: bounds.currency(profile.income_monthly),
            expenses_monthly: bounds.currency(profile.expenses_monthly),
            savings: bounds.currency(profile.savings),
            debt: bounds.currency(profile.debt),
            dependents: bounds.count(profile.dependents),
            industry: profile.industry.clone(),
            stability_label: profile.job_stability.label(),
            stability_weight: profile.job_stability.weight(),
            months_unemployed: bounds.months_unemployed(scenario.months_unemployed),
            expense_cut_pct: bounds.expense_cut_pct(scenario.expense_cut_pct),
            severance: bounds.currency(scenario.severance),
            monthly_expenses_cut: bounds.currency(metrics.monthly_expenses_cut),
            monthly_net_burn: bounds.signed_currency(metrics.monthly_net_burn),
            monthly_support: bounds.currency(metrics.monthly_support),
            one_time_expense: bounds.currency(metrics.one_time_expense),
            runway_months: bounds.runway(metrics.runway_months),
            debt_ratio: bounds.debt_ratio(metrics.debt_ratio),
            risk_score: bounds.risk(metrics.risk_score),
            adjusted_risk_score: bounds.risk(metrics.adjusted_risk_score),
            savings_total: bounds.currency(savings_total),
            months_until_zero: bounds.runway(stats.months_until_zero),
            max_drawdown: bounds.currency(stats.max_drawdown),
            trend_slope: bounds.signed_currency(stats.trend_slope),
            alert: analysis.alert.clone(),
        }
    }

    pub fn has_alert(&self) -> bool {
        self.alert != NO_ALERTS
    }
}

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("narrative service returned status {0}")]
    Status(u16),
    #[error("narrative service returned an empty summary")]
    EmptySummary,
}

/// Injected summarization capability; the HTTP implementation is optional
/// and the deterministic fallback never requires one.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, facts: &NarrativeFacts) -> Result<String, NarrativeError>;
}

pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

impl HttpSummarizer {
    pub fn new(config: &NarrativeConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, facts: &NarrativeFacts) -> Result<String, NarrativeError> {
        let response = self.client.post(&self.endpoint).json(facts).send().await?;
        if !response.status().is_success() {
            return Err(NarrativeError::Status(response.status().as_u16()));
        }

        let body: SummaryResponse = response.json().await?;
        let summary = body.summary.trim().to_string();
        if summary.is_empty() {
            return Err(NarrativeError::EmptySummary);
        }
        Ok(summary)
    }
}

/// Deterministic templated summary built from already-computed facts. Used
/// whenever the narrative service is unavailable or fails.
pub fn fallback_summary(facts: &NarrativeFacts) -> String {
    let mut summary_lines = Vec::new();
    if facts.monthly_net_burn > 0.0 {
        summary_lines.push(format!(
            "At a net burn of {:.2}/month, savings cover about {} month(s) of the planned {}-month gap.",
            facts.monthly_net_burn, facts.runway_months, facts.months_unemployed
        ));
    } else {
        summary_lines.push(format!(
            "Support income of {:.2}/month covers the reduced expenses; the balance does not deplete.",
            facts.monthly_support
        ));
    }
    summary_lines.push(format!(
        "Risk score {:.0}/100 ({} employment, {} industry).",
        facts.adjusted_risk_score, facts.stability_label, facts.industry
    ));

    let mut action_lines = Vec::new();
    if facts.monthly_net_burn > 0.0 {
        action_lines.push(format!(
            "Trim the {:.2}/month burn further or line up interim income.",
            facts.monthly_net_burn
        ));
    }
    if facts.savings_total > 0.0 {
        action_lines.push(format!(
            "Cancel unused subscriptions to recover {:.2}/month.",
            facts.savings_total
        ));
    }
    if action_lines.is_empty() {
        action_lines.push("No immediate changes needed; revisit if circumstances shift.".to_string());
    }

    let mut warning_lines = Vec::new();
    if facts.debt_ratio >= 1.0 {
        warning_lines.push(format!(
            "Debt is {:.2}x annual income; payments will outlast the runway.",
            facts.debt_ratio
        ));
    }
    if facts.dependents > 0 {
        warning_lines.push(format!(
            "{} dependent(s) raise the cost of an extended gap.",
            facts.dependents
        ));
    }
    if facts.has_alert() {
        warning_lines.push(facts.alert.clone());
    }
    if warning_lines.is_empty() {
        warning_lines.push("None.".to_string());
    }

    format!(
        "Summary: {}\n\nActions: {}\n\nWarnings: {}",
        summary_lines.join(" "),
        action_lines.join(" "),
        warning_lines.join(" ")
    )
}
