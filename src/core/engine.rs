use super::types::{Metrics, NewsEvent, Profile, Scenario, TimelineStats};

pub const RUNWAY_CAP_MONTHS: u32 = 60;

pub const MIN_TIMELINE_HORIZON: u32 = 36;

pub const NO_ALERTS: &str = "No active news alerts.";

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct CashflowModel {
    pub monthly_expenses_cut: f64,
    pub monthly_addons: f64,
    pub monthly_support: f64,
    pub starting_balance: f64,
    income_start_month: u32,
    income_start_amount: f64,
}

impl CashflowModel {
    pub fn project(profile: &Profile, scenario: &Scenario) -> Self {
        let monthly_expenses_cut = profile.expenses_monthly
            * (1.0 - scenario.expense_cut_pct / 100.0)
            + profile.debt_payment_monthly;

        // A negative support base is carried as an add-on shortfall; the
        // displayed support figure stays non-negative, the net burn does not change.
        let support_base = scenario.unemployment_benefit_monthly
            + scenario.other_income_monthly
            + scenario.income_change_monthly;
        let support_shortfall = (-support_base).max(0.0);
        let monthly_support = support_base.max(0.0);

        let monthly_addons = scenario.extra_monthly_expenses
            + scenario.debt_payment_monthly
            + scenario.healthcare_monthly
            + scenario.dependent_care_monthly
            + scenario.job_search_monthly
            + support_shortfall;

        let starting_balance = profile.savings + scenario.severance + scenario.one_time_income
            - (scenario.one_time_expense + scenario.relocation_cost);

        Self {
            monthly_expenses_cut,
            monthly_addons,
            monthly_support,
            starting_balance,
            income_start_month: scenario.income_start_month,
            income_start_amount: scenario.income_start_amount,
        }
    }

    fn support_for_month(&self, month: u32) -> f64 {
        let mut support = self.monthly_support;
        if self.income_start_month > 0
            && self.income_start_amount > 0.0
            && month >= self.income_start_month
        {
            support += self.income_start_amount;
        }
        support
    }

    pub fn net_burn(&self, month: u32) -> f64 {
        self.monthly_expenses_cut + self.monthly_addons - self.support_for_month(month)
    }
}

// 0 = already depleted; RUNWAY_CAP_MONTHS = never depletes within the horizon.
pub fn estimate_runway(starting_balance: f64, model: &CashflowModel) -> u32 {
    if starting_balance <= 0.0 {
        return 0;
    }

    let mut balance = starting_balance;
    for month in 1..=RUNWAY_CAP_MONTHS {
        balance -= model.net_burn(month);
        if balance <= 0.0 {
            return month;
        }
    }
    RUNWAY_CAP_MONTHS
}

pub fn debt_ratio(debt: f64, income_monthly: f64) -> f64 {
    let annual_income = income_monthly * 12.0;
    if annual_income <= 0.0 {
        return 1.0;
    }
    debt / annual_income
}

const INDUSTRY_ADJUSTMENTS: &[(&str, f64)] = &[
    ("tech", 8.0),
    ("finance", 4.0),
    ("healthcare", -4.0),
    ("education", -2.0),
    ("retail", 6.0),
    ("manufacturing", 4.0),
    ("hospitality", 8.0),
];

#[derive(Debug, Clone)]
pub struct RiskTables {
    pub base_score: f64,
    pub industry_adjustments: &'static [(&'static str, f64)],
    pub default_industry_adjustment: f64,
    pub debt_ratio_scale: f64,
    pub debt_ratio_cap: f64,
    pub gap_penalty_per_month: f64,
    pub gap_penalty_cap: f64,
    pub cushion_relief_per_month: f64,
    pub cushion_relief_cap: f64,
    pub reemployed_relief: f64,
}

impl Default for RiskTables {
    fn default() -> Self {
        Self {
            base_score: 60.0,
            industry_adjustments: INDUSTRY_ADJUSTMENTS,
            default_industry_adjustment: 2.0,
            debt_ratio_scale: 50.0,
            debt_ratio_cap: 20.0,
            gap_penalty_per_month: 4.0,
            gap_penalty_cap: 20.0,
            cushion_relief_per_month: 1.5,
            cushion_relief_cap: 10.0,
            reemployed_relief: 5.0,
        }
    }
}

impl RiskTables {
    fn industry_adjustment(&self, industry: &str) -> f64 {
        let key = industry.trim().to_ascii_lowercase();
        self.industry_adjustments
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, adjustment)| *adjustment)
            .unwrap_or(self.default_industry_adjustment)
    }

    fn runway_tier_adjustment(runway_months: u32) -> f64 {
        if runway_months >= 12 {
            -30.0
        } else if runway_months >= 6 {
            -20.0
        } else if runway_months >= 3 {
            -10.0
        } else if runway_months >= 1 {
            5.0
        } else {
            15.0
        }
    }

    pub fn base_risk(&self, profile: &Profile, runway_months: u32) -> f64 {
        let mut score = self.base_score;
        score += Self::runway_tier_adjustment(runway_months);
        let ratio = debt_ratio(profile.debt, profile.income_monthly);
        score += (ratio * self.debt_ratio_scale).clamp(0.0, self.debt_ratio_cap);
        score += profile.job_stability.weight();
        score += self.industry_adjustment(&profile.industry);
        score.clamp(0.0, 100.0)
    }

    pub fn adjust_for_scenario(
        &self,
        base_risk: f64,
        months_unemployed: u32,
        runway_months: u32,
    ) -> f64 {
        if months_unemployed == 0 {
            return (base_risk - self.reemployed_relief).clamp(0.0, 100.0);
        }

        let gap = months_unemployed.saturating_sub(runway_months) as f64;
        let cushion = runway_months.saturating_sub(months_unemployed) as f64;
        let penalty = (gap * self.gap_penalty_per_month).clamp(0.0, self.gap_penalty_cap);
        let relief = (cushion * self.cushion_relief_per_month).clamp(0.0, self.cushion_relief_cap);
        (base_risk + penalty - relief).clamp(0.0, 100.0)
    }

    pub fn apply_news_event(
        &self,
        risk_score: f64,
        event: Option<&NewsEvent>,
        profile_industry: &str,
    ) -> (f64, String) {
        let Some(event) = event else {
            return (risk_score, NO_ALERTS.to_string());
        };

        let mut delta = event.risk_delta;
        if let Some(event_industry) = &event.industry {
            if !event_industry.trim().eq_ignore_ascii_case(profile_industry.trim()) {
                delta /= 2.0;
            }
        }

        let adjusted = (risk_score + delta).clamp(0.0, 100.0);
        let alert = format!("News alert: \"{}\" applied {:+} to risk.", event.headline, delta);
        (adjusted, alert)
    }
}

pub fn timeline_horizon(scenario: &Scenario) -> u32 {
    scenario
        .months_unemployed
        .max(1)
        .max(scenario.income_start_month)
        .max(MIN_TIMELINE_HORIZON)
}

pub fn build_timeline(model: &CashflowModel, horizon: u32) -> Vec<f64> {
    let mut timeline = Vec::with_capacity(horizon as usize + 1);
    let mut balance = round2(model.starting_balance);
    timeline.push(balance);
    for month in 1..=horizon {
        balance = round2(balance - model.net_burn(month));
        timeline.push(balance);
    }
    timeline
}

pub fn timeline_stats(timeline: &[f64]) -> TimelineStats {
    if timeline.is_empty() {
        return TimelineStats {
            months_until_zero: 0,
            max_drawdown: 0.0,
            trend_slope: 0.0,
        };
    }

    let months_until_zero = timeline
        .iter()
        .position(|&balance| balance <= 0.0)
        .unwrap_or(timeline.len() - 1) as u32;

    let mut lowest = f64::INFINITY;
    let mut highest = f64::NEG_INFINITY;
    for &balance in timeline {
        lowest = lowest.min(balance);
        highest = highest.max(balance);
    }

    let first = timeline[0];
    let last = timeline[timeline.len() - 1];
    let span = (timeline.len() - 1).max(1) as f64;

    TimelineStats {
        months_until_zero,
        max_drawdown: round2(highest - lowest),
        trend_slope: round2((last - first) / span),
    }
}

// Range restriction for values handed to the narrative service. Never
// changes which alerts fire, only what numeric value is shown.
#[derive(Debug, Clone, Copy)]
pub struct OutputBounds {
    pub currency_ceiling: f64,
    pub runway_max: u32,
    pub debt_ratio_max: f64,
    pub risk_max: f64,
    pub expense_cut_pct_max: f64,
    pub months_unemployed_max: u32,
    pub count_ceiling: u32,
}

impl Default for OutputBounds {
    fn default() -> Self {
        Self {
            currency_ceiling: 10_000_000.0,
            runway_max: RUNWAY_CAP_MONTHS,
            debt_ratio_max: 3.0,
            risk_max: 100.0,
            expense_cut_pct_max: 70.0,
            months_unemployed_max: 36,
            count_ceiling: 50,
        }
    }
}

impl OutputBounds {
    pub fn currency(&self, value: f64) -> f64 {
        value.clamp(0.0, self.currency_ceiling)
    }

    pub fn signed_currency(&self, value: f64) -> f64 {
        value.clamp(-self.currency_ceiling, self.currency_ceiling)
    }

    pub fn runway(&self, months: u32) -> u32 {
        months.min(self.runway_max)
    }

    pub fn debt_ratio(&self, value: f64) -> f64 {
        value.clamp(0.0, self.debt_ratio_max)
    }

    pub fn risk(&self, value: f64) -> f64 {
        value.clamp(0.0, self.risk_max)
    }

    pub fn expense_cut_pct(&self, value: f64) -> f64 {
        value.clamp(0.0, self.expense_cut_pct_max)
    }

    pub fn months_unemployed(&self, months: u32) -> u32 {
        months.min(self.months_unemployed_max)
    }

    pub fn count(&self, value: u32) -> u32 {
        value.min(self.count_ceiling)
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub metrics: Metrics,
    pub timeline: Vec<f64>,
    pub stats: TimelineStats,
    pub alert: String,
}

pub fn run_analysis(
    profile: &Profile,
    scenario: &Scenario,
    news_event: Option<&NewsEvent>,
) -> Analysis {
    let tables = RiskTables::default();
    let model = CashflowModel::project(profile, scenario);
    let runway_months = estimate_runway(model.starting_balance, &model);

    let base = tables.base_risk(profile, runway_months);
    let risk_score = tables.adjust_for_scenario(base, scenario.months_unemployed, runway_months);
    let (adjusted_risk_score, alert) =
        tables.apply_news_event(risk_score, news_event, &profile.industry);

    let timeline = build_timeline(&model, timeline_horizon(scenario));
    let stats = timeline_stats(&timeline);

    let metrics = Metrics {
        monthly_expenses_cut: round2(model.monthly_expenses_cut),
        monthly_net_burn: round2(model.net_burn(1)),
        monthly_support: round2(model.monthly_support),
        one_time_expense: round2(scenario.one_time_expense + scenario.relocation_cost),
        runway_months,
        debt_ratio: round2(debt_ratio(profile.debt, profile.income_monthly)),
        risk_score: round2(risk_score),
        adjusted_risk_score: round2(adjusted_risk_score),
    };

    Analysis {
        metrics,
        timeline,
        stats,
        alert,
    }
}
