//! Parallel stress-scenario engine. Intentionally simpler than the primary
//! pipeline: runway here is a plain savings-over-net division with an
//! unbounded sentinel, and scoring is tier-only. The two models are kept as
//! distinct engines; do not fold one into the other.

use serde::{Deserialize, Serialize, Serializer};

use super::engine::round2;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDef {
    pub name: String,
    pub income_factor: f64,
    pub expense_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WhatIfRunway {
    Unbounded,
    Months(f64),
}

impl WhatIfRunway {
    pub fn months(self) -> Option<f64> {
        match self {
            Self::Unbounded => None,
            Self::Months(months) => Some(months),
        }
    }
}

impl Serialize for WhatIfRunway {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unbounded => serializer.serialize_str("infinite"),
            Self::Months(months) => serializer.serialize_f64(*months),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WhatIfStatus {
    Stable,
    Watch,
    AtRisk,
    Critical,
}

impl WhatIfStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Watch => "watch",
            Self::AtRisk => "at_risk",
            Self::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfMetrics {
    pub income_monthly: f64,
    pub expenses_monthly: f64,
    pub net_monthly: f64,
    pub runway: WhatIfRunway,
    pub severity: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParams {
    pub income_factor: f64,
    pub expense_factor: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineOutcome {
    pub metrics: WhatIfMetrics,
    pub status: WhatIfStatus,
    pub actions: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioOutcome {
    pub name: String,
    pub params: ScenarioParams,
    pub metrics: WhatIfMetrics,
    pub status: WhatIfStatus,
    pub actions: Vec<&'static str>,
    pub runway_change_pct: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct WhatIfMetadata {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfReport {
    pub baseline: BaselineOutcome,
    pub scenarios: Vec<ScenarioOutcome>,
    pub metadata: WhatIfMetadata,
}

pub fn default_scenarios() -> Vec<ScenarioDef> {
    vec![
        ScenarioDef {
            name: "expense_increase_20".to_string(),
            income_factor: 1.0,
            expense_factor: 1.2,
        },
        ScenarioDef {
            name: "income_drop_20".to_string(),
            income_factor: 0.8,
            expense_factor: 1.0,
        },
        ScenarioDef {
            name: "combined_shock".to_string(),
            income_factor: 0.8,
            expense_factor: 1.2,
        },
        ScenarioDef {
            name: "job_loss".to_string(),
            income_factor: 0.0,
            expense_factor: 1.0,
        },
        ScenarioDef {
            name: "expense_spike_50".to_string(),
            income_factor: 1.0,
            expense_factor: 1.5,
        },
    ]
}

fn scenario_runway(income: f64, expenses: f64, savings: f64) -> WhatIfRunway {
    let net = income - expenses;
    if net >= 0.0 {
        WhatIfRunway::Unbounded
    } else {
        WhatIfRunway::Months(savings / net.abs())
    }
}

fn classify(runway: WhatIfRunway) -> WhatIfStatus {
    match runway.months() {
        None => WhatIfStatus::Stable,
        Some(months) if months >= 12.0 => WhatIfStatus::Stable,
        Some(months) if months >= 6.0 => WhatIfStatus::Watch,
        Some(months) if months >= 3.0 => WhatIfStatus::AtRisk,
        Some(_) => WhatIfStatus::Critical,
    }
}

fn severity(runway: WhatIfRunway) -> f64 {
    match runway.months() {
        None => 0.1,
        Some(months) if months >= 12.0 => 0.1,
        Some(months) if months >= 6.0 => 0.3,
        Some(months) if months >= 3.0 => 0.6,
        Some(months) if months >= 1.0 => 0.9,
        Some(_) => 1.0,
    }
}

fn push_unique(actions: &mut Vec<&'static str>, code: &'static str) {
    if !actions.contains(&code) {
        actions.push(code);
    }
}

fn action_codes(net: f64, runway: WhatIfRunway, baseline_runway: WhatIfRunway) -> Vec<&'static str> {
    let mut actions = Vec::new();

    if net < 0.0 {
        push_unique(&mut actions, "reduce_expenses");
        push_unique(&mut actions, "increase_income");
    }
    if let Some(base) = baseline_runway.months() {
        if base < 6.0 {
            push_unique(&mut actions, "build_savings");
        }
    }
    if let (Some(base), Some(shocked)) = (baseline_runway.months(), runway.months()) {
        if base > 0.0 && shocked / base < 0.5 {
            push_unique(&mut actions, "stress_test_plans");
        }
    }
    if let Some(base) = baseline_runway.months() {
        if base < 3.0 {
            push_unique(&mut actions, "prioritize_liquidity");
            push_unique(&mut actions, "debt_refinance");
        }
    }

    actions
}

// Sentinels: both unbounded -> 0.0, baseline-only unbounded -> -1.0,
// scenario-only unbounded -> +1.0.
fn runway_change_pct(baseline: WhatIfRunway, scenario: WhatIfRunway) -> f64 {
    match (baseline.months(), scenario.months()) {
        (None, None) => 0.0,
        (None, Some(_)) => -1.0,
        (Some(_), None) => 1.0,
        (Some(base), Some(shocked)) => {
            if base <= 0.0 {
                0.0
            } else {
                (shocked - base) / base
            }
        }
    }
}

fn metrics_for(income: f64, expenses: f64, runway: WhatIfRunway) -> WhatIfMetrics {
    WhatIfMetrics {
        income_monthly: round2(income),
        expenses_monthly: round2(expenses),
        net_monthly: round2(income - expenses),
        runway: match runway {
            WhatIfRunway::Months(months) => WhatIfRunway::Months(round2(months)),
            WhatIfRunway::Unbounded => WhatIfRunway::Unbounded,
        },
        severity: severity(runway),
    }
}

pub fn run_what_if(
    income_monthly: f64,
    expenses_monthly: f64,
    savings: f64,
    custom: &[ScenarioDef],
) -> WhatIfReport {
    let baseline_runway = scenario_runway(income_monthly, expenses_monthly, savings);
    let baseline_net = income_monthly - expenses_monthly;
    let baseline = BaselineOutcome {
        metrics: metrics_for(income_monthly, expenses_monthly, baseline_runway),
        status: classify(baseline_runway),
        actions: action_codes(baseline_net, baseline_runway, baseline_runway),
    };

    let mut defs = default_scenarios();
    defs.extend_from_slice(custom);

    let scenarios: Vec<ScenarioOutcome> = defs
        .into_iter()
        .map(|def| {
            let income = income_monthly * def.income_factor;
            let expenses = expenses_monthly * def.expense_factor;
            let runway = scenario_runway(income, expenses, savings);
            ScenarioOutcome {
                params: ScenarioParams {
                    income_factor: def.income_factor,
                    expense_factor: def.expense_factor,
                },
                metrics: metrics_for(income, expenses, runway),
                status: classify(runway),
                actions: action_codes(income - expenses, runway, baseline_runway),
                runway_change_pct: runway_change_pct(baseline_runway, runway),
                name: def.name,
            }
        })
        .collect();

    WhatIfReport {
        metadata: WhatIfMetadata {
            count: scenarios.len(),
        },
        baseline,
        scenarios,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn outcome<'a>(report: &'a WhatIfReport, name: &str) -> &'a ScenarioOutcome {
        report
            .scenarios
            .iter()
            .find(|scenario| scenario.name == name)
            .unwrap_or_else(|| panic!("missing scenario {name}"))
    }

    #[test]
    fn surplus_household_has_unbounded_baseline_runway() {
        let report = run_what_if(5_000.0, 3_000.0, 20_000.0, &[]);
        assert_eq!(report.baseline.metrics.runway, WhatIfRunway::Unbounded);
        assert_eq!(report.baseline.status, WhatIfStatus::Stable);
        assert!(report.baseline.actions.is_empty());
        assert_eq!(report.metadata.count, 5);
    }

    #[test]
    fn job_loss_scenario_flags_expense_and_income_actions() {
        let report = run_what_if(3_000.0, 2_500.0, 10_000.0, &[]);
        let job_loss = outcome(&report, "job_loss");

        // income 0, expenses 2500: 10000 / 2500 = 4 months.
        assert_eq!(job_loss.metrics.runway, WhatIfRunway::Months(4.0));
        assert_eq!(job_loss.status, WhatIfStatus::AtRisk);
        assert!(job_loss.actions.contains(&"reduce_expenses"));
        assert!(job_loss.actions.contains(&"increase_income"));
        assert_eq!(job_loss.metrics.severity, 0.6);
    }

    #[test]
    fn delta_sentinels_cover_unbounded_combinations() {
        // Baseline and every stressed variant stay cash-flow positive.
        let report = run_what_if(10_000.0, 1_000.0, 5_000.0, &[]);
        let spike = outcome(&report, "expense_spike_50");
        assert_eq!(spike.runway_change_pct, 0.0);

        // Baseline unbounded, job loss finite.
        let job_loss = outcome(&report, "job_loss");
        assert_eq!(job_loss.runway_change_pct, -1.0);

        // Baseline finite, custom recovery scenario unbounded.
        let custom = vec![ScenarioDef {
            name: "windfall".to_string(),
            income_factor: 3.0,
            expense_factor: 1.0,
        }];
        let report = run_what_if(2_000.0, 2_500.0, 9_000.0, &custom);
        let windfall = outcome(&report, "windfall");
        assert_eq!(windfall.runway_change_pct, 1.0);
    }

    #[test]
    fn finite_delta_is_fractional_change_against_baseline() {
        // Baseline: net -500, runway 18; expense spike: net -1750, runway ~5.14.
        let report = run_what_if(2_000.0, 2_500.0, 9_000.0, &[]);
        let spike = outcome(&report, "expense_spike_50");
        let expected = (9_000.0 / 1_750.0 - 18.0) / 18.0;
        assert!((spike.runway_change_pct - expected).abs() <= EPS);
    }

    #[test]
    fn zero_savings_baseline_yields_zero_delta_not_nan() {
        let report = run_what_if(2_000.0, 2_500.0, 0.0, &[]);
        let job_loss = outcome(&report, "job_loss");
        assert_eq!(job_loss.runway_change_pct, 0.0);
        assert_eq!(job_loss.status, WhatIfStatus::Critical);
    }

    #[test]
    fn short_baseline_runway_adds_liquidity_actions_in_priority_order() {
        // Baseline: net -2000, savings 4000 -> 2 months.
        let report = run_what_if(1_000.0, 3_000.0, 4_000.0, &[]);
        assert_eq!(
            report.baseline.actions,
            vec![
                "reduce_expenses",
                "increase_income",
                "build_savings",
                "prioritize_liquidity",
                "debt_refinance",
            ]
        );
    }

    #[test]
    fn halved_runway_triggers_stress_test_action() {
        // Baseline: net -500 -> 24 months; combined shock: net -1600 -> 7.5.
        let report = run_what_if(2_500.0, 3_000.0, 12_000.0, &[]);
        let shock = outcome(&report, "combined_shock");
        assert!(shock.actions.contains(&"stress_test_plans"));
    }

    #[test]
    fn status_tiers_follow_runway_thresholds() {
        assert_eq!(classify(WhatIfRunway::Unbounded), WhatIfStatus::Stable);
        assert_eq!(classify(WhatIfRunway::Months(12.0)), WhatIfStatus::Stable);
        assert_eq!(classify(WhatIfRunway::Months(6.0)), WhatIfStatus::Watch);
        assert_eq!(classify(WhatIfRunway::Months(3.0)), WhatIfStatus::AtRisk);
        assert_eq!(classify(WhatIfRunway::Months(2.9)), WhatIfStatus::Critical);
    }

    #[test]
    fn severity_follows_runway_tiers() {
        assert_eq!(severity(WhatIfRunway::Unbounded), 0.1);
        assert_eq!(severity(WhatIfRunway::Months(12.0)), 0.1);
        assert_eq!(severity(WhatIfRunway::Months(6.0)), 0.3);
        assert_eq!(severity(WhatIfRunway::Months(3.0)), 0.6);
        assert_eq!(severity(WhatIfRunway::Months(1.0)), 0.9);
        assert_eq!(severity(WhatIfRunway::Months(0.5)), 1.0);
    }

    #[test]
    fn custom_scenarios_are_appended_after_defaults() {
        let custom = vec![ScenarioDef {
            name: "rent_doubles".to_string(),
            income_factor: 1.0,
            expense_factor: 2.0,
        }];
        let report = run_what_if(3_000.0, 2_000.0, 6_000.0, &custom);
        assert_eq!(report.metadata.count, 6);
        assert_eq!(report.scenarios.last().map(|s| s.name.as_str()), Some("rent_doubles"));
    }

    #[test]
    fn runway_serializes_as_number_or_infinite_sentinel() {
        let finite = serde_json::to_value(WhatIfRunway::Months(4.5)).expect("serializes");
        assert_eq!(finite, serde_json::json!(4.5));
        let unbounded = serde_json::to_value(WhatIfRunway::Unbounded).expect("serializes");
        assert_eq!(unbounded, serde_json::json!("infinite"));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_every_outcome_is_internally_consistent(
            income in 0u32..30_000,
            expenses in 0u32..30_000,
            savings in 0u32..500_000
        ) {
            let report = run_what_if(income as f64, expenses as f64, savings as f64, &[]);
            for scenario in &report.scenarios {
                prop_assert!((0.0..=1.0).contains(&scenario.metrics.severity));
                match scenario.metrics.runway {
                    WhatIfRunway::Unbounded => {
                        prop_assert!(scenario.metrics.net_monthly >= 0.0);
                        prop_assert!(scenario.status == WhatIfStatus::Stable);
                    }
                    WhatIfRunway::Months(months) => {
                        prop_assert!(months >= 0.0);
                        prop_assert!(scenario.metrics.net_monthly <= 0.0);
                    }
                }
                prop_assert!(scenario.runway_change_pct.is_finite());
            }
        }
    }
}
