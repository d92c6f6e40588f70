use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum JobStability {
    Stable,
    Medium,
    Unstable,
}

impl JobStability {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stable" | "full-time" | "full time" | "fulltime" | "permanent" | "salaried" => {
                Self::Stable
            }
            "medium" | "gig" | "contract" | "contractor" | "freelance" | "part-time"
            | "part time" | "self-employed" => Self::Medium,
            "unstable" | "unemployed" | "temporary" | "temp" | "seasonal" | "at-risk"
            | "at risk" => Self::Unstable,
            _ => Self::Medium,
        }
    }

    pub fn weight(self) -> f64 {
        match self {
            Self::Stable => -8.0,
            Self::Medium => 4.0,
            Self::Unstable => 12.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Stable => "Stable",
            Self::Medium => "Medium",
            Self::Unstable => "Unstable",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub income_monthly: f64,
    pub expenses_monthly: f64,
    pub savings: f64,
    pub debt: f64,
    pub debt_payment_monthly: f64,
    pub industry: String,
    pub job_stability: JobStability,
    pub dependents: u32,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            income_monthly: 0.0,
            expenses_monthly: 0.0,
            savings: 0.0,
            debt: 0.0,
            debt_payment_monthly: 0.0,
            industry: "Other".to_string(),
            job_stability: JobStability::Stable,
            dependents: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub months_unemployed: u32,
    pub expense_cut_pct: f64,
    pub severance: f64,
    pub unemployment_benefit_monthly: f64,
    pub other_income_monthly: f64,
    pub income_change_monthly: f64,
    pub extra_monthly_expenses: f64,
    pub debt_payment_monthly: f64,
    pub healthcare_monthly: f64,
    pub dependent_care_monthly: f64,
    pub job_search_monthly: f64,
    pub one_time_expense: f64,
    pub one_time_income: f64,
    pub relocation_cost: f64,
    pub income_start_month: u32,
    pub income_start_amount: f64,
}

#[derive(Debug, Clone)]
pub struct NewsEvent {
    pub headline: String,
    pub risk_delta: f64,
    pub industry: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Subscription {
    pub name: String,
    pub monthly_cost: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub monthly_expenses_cut: f64,
    pub monthly_net_burn: f64,
    pub monthly_support: f64,
    pub one_time_expense: f64,
    pub runway_months: u32,
    pub debt_ratio: f64,
    pub risk_score: f64,
    pub adjusted_risk_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineStats {
    pub months_until_zero: u32,
    pub max_drawdown: f64,
    pub trend_slope: f64,
}
