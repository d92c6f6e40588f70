use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use crate::core::whatif::{ScenarioDef, WhatIfReport, run_what_if};
use crate::core::{
    JobStability, Metrics, NewsEvent, Profile, Scenario, Subscription, round2, run_analysis,
};
use crate::narrative::{
    HttpSummarizer, NarrativeConfig, NarrativeFacts, Summarizer, fallback_summary,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfilePayload {
    income_monthly: Option<f64>,
    expenses_monthly: Option<f64>,
    savings: Option<f64>,
    debt: Option<f64>,
    debt_payment_monthly: Option<f64>,
    industry: Option<String>,
    job_stability: Option<String>,
    dependents: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScenarioPayload {
    months_unemployed: Option<u32>,
    expense_cut_pct: Option<f64>,
    severance: Option<f64>,
    unemployment_benefit_monthly: Option<f64>,
    other_income_monthly: Option<f64>,
    income_change_monthly: Option<f64>,
    extra_monthly_expenses: Option<f64>,
    debt_payment_monthly: Option<f64>,
    healthcare_monthly: Option<f64>,
    dependent_care_monthly: Option<f64>,
    job_search_monthly: Option<f64>,
    one_time_expense: Option<f64>,
    one_time_income: Option<f64>,
    relocation_cost: Option<f64>,
    income_start_month: Option<u32>,
    income_start_amount: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SubscriptionPayload {
    name: Option<String>,
    monthly_cost: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NewsEventPayload {
    headline: Option<String>,
    risk_delta: Option<f64>,
    industry: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AnalyzePayload {
    profile: ProfilePayload,
    scenario: ScenarioPayload,
    subscriptions: Vec<SubscriptionPayload>,
    news_event: Option<NewsEventPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CustomScenarioPayload {
    name: Option<String>,
    income_factor: Option<f64>,
    expense_factor: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct WhatIfPayload {
    income_monthly: Option<f64>,
    expenses_monthly: Option<f64>,
    savings: Option<f64>,
    custom_scenarios: Vec<CustomScenarioPayload>,
}

#[derive(Debug)]
struct AnalysisRequest {
    profile: Profile,
    scenario: Scenario,
    subscriptions: Vec<Subscription>,
    news_event: Option<NewsEvent>,
}

#[derive(Debug)]
struct WhatIfRequest {
    income_monthly: f64,
    expenses_monthly: f64,
    savings: f64,
    custom_scenarios: Vec<ScenarioDef>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    metrics: Metrics,
    timeline: Vec<f64>,
    savings_total: f64,
    alert: String,
    summary: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn require_non_negative(name: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite value >= 0"));
    }
    Ok(())
}

fn build_profile(payload: ProfilePayload) -> Result<Profile, String> {
    let mut profile = Profile::default();

    if let Some(v) = payload.income_monthly {
        profile.income_monthly = v;
    }
    if let Some(v) = payload.expenses_monthly {
        profile.expenses_monthly = v;
    }
    if let Some(v) = payload.savings {
        profile.savings = v;
    }
    if let Some(v) = payload.debt {
        profile.debt = v;
    }
    if let Some(v) = payload.debt_payment_monthly {
        profile.debt_payment_monthly = v;
    }
    if let Some(industry) = payload.industry {
        if !industry.trim().is_empty() {
            profile.industry = industry.trim().to_string();
        }
    }
    if let Some(raw) = payload.job_stability {
        profile.job_stability = JobStability::parse(&raw);
    }
    if let Some(v) = payload.dependents {
        profile.dependents = v;
    }

    for (name, value) in [
        ("profile.incomeMonthly", profile.income_monthly),
        ("profile.expensesMonthly", profile.expenses_monthly),
        ("profile.savings", profile.savings),
        ("profile.debt", profile.debt),
        ("profile.debtPaymentMonthly", profile.debt_payment_monthly),
    ] {
        require_non_negative(name, value)?;
    }

    Ok(profile)
}

fn build_scenario(payload: ScenarioPayload) -> Result<Scenario, String> {
    let mut scenario = Scenario::default();

    if let Some(v) = payload.months_unemployed {
        scenario.months_unemployed = v;
    }
    if let Some(v) = payload.expense_cut_pct {
        scenario.expense_cut_pct = v;
    }
    if let Some(v) = payload.severance {
        scenario.severance = v;
    }
    if let Some(v) = payload.unemployment_benefit_monthly {
        scenario.unemployment_benefit_monthly = v;
    }
    if let Some(v) = payload.other_income_monthly {
        scenario.other_income_monthly = v;
    }
    if let Some(v) = payload.income_change_monthly {
        scenario.income_change_monthly = v;
    }
    if let Some(v) = payload.extra_monthly_expenses {
        scenario.extra_monthly_expenses = v;
    }
    if let Some(v) = payload.debt_payment_monthly {
        scenario.debt_payment_monthly = v;
    }
    if let Some(v) = payload.healthcare_monthly {
        scenario.healthcare_monthly = v;
    }
    if let Some(v) = payload.dependent_care_monthly {
        scenario.dependent_care_monthly = v;
    }
    if let Some(v) = payload.job_search_monthly {
        scenario.job_search_monthly = v;
    }
    if let Some(v) = payload.one_time_expense {
        scenario.one_time_expense = v;
    }
    if let Some(v) = payload.one_time_income {
        scenario.one_time_income = v;
    }
    if let Some(v) = payload.relocation_cost {
        scenario.relocation_cost = v;
    }
    if let Some(v) = payload.income_start_month {
        scenario.income_start_month = v;
    }
    if let Some(v) = payload.income_start_amount {
        scenario.income_start_amount = v;
    }

    if scenario.months_unemployed > 36 {
        return Err("scenario.monthsUnemployed must be between 0 and 36".to_string());
    }
    if !scenario.expense_cut_pct.is_finite() || !(0.0..=70.0).contains(&scenario.expense_cut_pct) {
        return Err("scenario.expenseCutPct must be between 0 and 70".to_string());
    }
    if scenario.income_start_month > 60 {
        return Err("scenario.incomeStartMonth must be between 0 and 60".to_string());
    }
    if !scenario.income_change_monthly.is_finite() {
        return Err("scenario.incomeChangeMonthly must be a finite value".to_string());
    }

    for (name, value) in [
        ("scenario.severance", scenario.severance),
        (
            "scenario.unemploymentBenefitMonthly",
            scenario.unemployment_benefit_monthly,
        ),
        ("scenario.otherIncomeMonthly", scenario.other_income_monthly),
        ("scenario.extraMonthlyExpenses", scenario.extra_monthly_expenses),
        ("scenario.debtPaymentMonthly", scenario.debt_payment_monthly),
        ("scenario.healthcareMonthly", scenario.healthcare_monthly),
        (
            "scenario.dependentCareMonthly",
            scenario.dependent_care_monthly,
        ),
        ("scenario.jobSearchMonthly", scenario.job_search_monthly),
        ("scenario.oneTimeExpense", scenario.one_time_expense),
        ("scenario.oneTimeIncome", scenario.one_time_income),
        ("scenario.relocationCost", scenario.relocation_cost),
        ("scenario.incomeStartAmount", scenario.income_start_amount),
    ] {
        require_non_negative(name, value)?;
    }

    Ok(scenario)
}

fn build_subscriptions(payloads: Vec<SubscriptionPayload>) -> Result<Vec<Subscription>, String> {
    let mut subscriptions = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let monthly_cost = payload.monthly_cost.unwrap_or(0.0);
        require_non_negative("subscriptions.monthlyCost", monthly_cost)?;
        subscriptions.push(Subscription {
            name: payload.name.unwrap_or_default(),
            monthly_cost,
        });
    }
    Ok(subscriptions)
}

fn build_news_event(payload: NewsEventPayload) -> Result<NewsEvent, String> {
    let headline = payload.headline.unwrap_or_default();
    if headline.trim().is_empty() {
        return Err("newsEvent.headline must not be empty".to_string());
    }

    let risk_delta = payload.risk_delta.unwrap_or(0.0);
    if !risk_delta.is_finite() || !(-50.0..=50.0).contains(&risk_delta) {
        return Err("newsEvent.riskDelta must be between -50 and 50".to_string());
    }

    Ok(NewsEvent {
        headline,
        risk_delta,
        industry: payload.industry.filter(|industry| !industry.trim().is_empty()),
    })
}

fn analysis_request_from_payload(payload: AnalyzePayload) -> Result<AnalysisRequest, String> {
    let profile = build_profile(payload.profile)?;
    let scenario = build_scenario(payload.scenario)?;
    let subscriptions = build_subscriptions(payload.subscriptions)?;
    let news_event = payload.news_event.map(build_news_event).transpose()?;

    Ok(AnalysisRequest {
        profile,
        scenario,
        subscriptions,
        news_event,
    })
}

fn what_if_request_from_payload(payload: WhatIfPayload) -> Result<WhatIfRequest, String> {
    let income_monthly = payload.income_monthly.unwrap_or(0.0);
    let expenses_monthly = payload.expenses_monthly.unwrap_or(0.0);
    let savings = payload.savings.unwrap_or(0.0);

    for (name, value) in [
        ("incomeMonthly", income_monthly),
        ("expensesMonthly", expenses_monthly),
        ("savings", savings),
    ] {
        require_non_negative(name, value)?;
    }

    let mut custom_scenarios = Vec::with_capacity(payload.custom_scenarios.len());
    for custom in payload.custom_scenarios {
        let name = custom.name.unwrap_or_default();
        if name.trim().is_empty() {
            return Err("customScenarios.name must not be empty".to_string());
        }
        let income_factor = custom.income_factor.unwrap_or(1.0);
        let expense_factor = custom.expense_factor.unwrap_or(1.0);
        require_non_negative("customScenarios.incomeFactor", income_factor)?;
        require_non_negative("customScenarios.expenseFactor", expense_factor)?;
        custom_scenarios.push(ScenarioDef {
            name: name.trim().to_string(),
            income_factor,
            expense_factor,
        });
    }

    Ok(WhatIfRequest {
        income_monthly,
        expenses_monthly,
        savings,
        custom_scenarios,
    })
}

fn savings_total(subscriptions: &[Subscription]) -> f64 {
    round2(
        subscriptions
            .iter()
            .map(|subscription| subscription.monthly_cost)
            .sum(),
    )
}

#[derive(Clone)]
struct AppState {
    summarizer: Option<Arc<dyn Summarizer>>,
}

pub async fn run_http_server(
    port: u16,
    narrative: Option<NarrativeConfig>,
) -> std::io::Result<()> {
    let summarizer: Option<Arc<dyn Summarizer>> = match narrative {
        Some(config) => match HttpSummarizer::new(&config) {
            Ok(client) => {
                tracing::info!(endpoint = %config.endpoint, "narrative service enabled");
                Some(Arc::new(client))
            }
            Err(error) => {
                tracing::warn!(%error, "narrative client unavailable; using fallback summaries");
                None
            }
        },
        None => {
            tracing::info!("no narrative endpoint configured; using fallback summaries");
            None
        }
    };

    let state = AppState { summarizer };
    let app = Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/api/whatif", post(whatif_handler))
        .fallback(not_found_handler)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("runway HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzePayload>,
) -> Response {
    let request = match analysis_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let analysis = run_analysis(
        &request.profile,
        &request.scenario,
        request.news_event.as_ref(),
    );
    let savings_total = savings_total(&request.subscriptions);
    let facts = NarrativeFacts::collect(&request.profile, &request.scenario, &analysis, savings_total);

    let summary = match &state.summarizer {
        Some(summarizer) => match summarizer.summarize(&facts).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(%error, "narrative service failed; using fallback summary");
                fallback_summary(&facts)
            }
        },
        None => fallback_summary(&facts),
    };

    json_response(
        StatusCode::OK,
        AnalyzeResponse {
            metrics: analysis.metrics,
            timeline: analysis.timeline,
            savings_total,
            alert: analysis.alert,
            summary,
        },
    )
}

async fn whatif_handler(Json(payload): Json<WhatIfPayload>) -> Response {
    let request = match what_if_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let report: WhatIfReport = run_what_if(
        request.income_monthly,
        request.expenses_monthly,
        request.savings,
        &request.custom_scenarios,
    );
    json_response(StatusCode::OK, report)
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn analysis_request_from_json(json: &str) -> Result<AnalysisRequest, String> {
        let payload = serde_json::from_str::<AnalyzePayload>(json)
            .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
        analysis_request_from_payload(payload)
    }

    fn what_if_request_from_json(json: &str) -> Result<WhatIfRequest, String> {
        let payload = serde_json::from_str::<WhatIfPayload>(json)
            .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
        what_if_request_from_payload(payload)
    }

    #[test]
    fn analyze_request_parses_web_keys() {
        let json = r#"{
          "profile": {
            "incomeMonthly": 5200,
            "expensesMonthly": 3400,
            "savings": 12000,
            "debt": 15000,
            "industry": "Tech",
            "jobStability": "full-time",
            "dependents": 1
          },
          "scenario": {
            "monthsUnemployed": 6,
            "expenseCutPct": 15,
            "severance": 3000,
            "incomeStartMonth": 4,
            "incomeStartAmount": 800
          },
          "subscriptions": [
            {"name": "Streaming", "monthlyCost": 15.99},
            {"name": "Gym", "monthlyCost": 29.5}
          ],
          "newsEvent": {"headline": "Layoffs widen", "riskDelta": 15, "industry": "Tech"}
        }"#;

        let request = analysis_request_from_json(json).expect("json should parse");
        assert_approx(request.profile.income_monthly, 5_200.0);
        assert_eq!(request.profile.job_stability, JobStability::Stable);
        assert_eq!(request.profile.dependents, 1);
        assert_eq!(request.scenario.months_unemployed, 6);
        assert_approx(request.scenario.expense_cut_pct, 15.0);
        assert_eq!(request.scenario.income_start_month, 4);
        assert_eq!(request.subscriptions.len(), 2);
        let event = request.news_event.expect("news event expected");
        assert_approx(event.risk_delta, 15.0);
        assert_eq!(event.industry.as_deref(), Some("Tech"));
    }

    #[test]
    fn analyze_request_applies_documented_defaults() {
        let request = analysis_request_from_json("{}").expect("empty payload is valid");
        assert_eq!(request.profile.industry, "Other");
        assert_eq!(request.profile.job_stability, JobStability::Stable);
        assert_eq!(request.scenario.months_unemployed, 0);
        assert!(request.subscriptions.is_empty());
        assert!(request.news_event.is_none());
    }

    #[test]
    fn analyze_request_rejects_negative_profile_fields() {
        let err = analysis_request_from_json(r#"{"profile": {"incomeMonthly": -1}}"#)
            .expect_err("must reject negative income");
        assert!(err.contains("profile.incomeMonthly"));
    }

    #[test]
    fn analyze_request_rejects_out_of_range_scenario_fields() {
        let err = analysis_request_from_json(r#"{"scenario": {"monthsUnemployed": 37}}"#)
            .expect_err("must reject months over 36");
        assert!(err.contains("scenario.monthsUnemployed"));

        let err = analysis_request_from_json(r#"{"scenario": {"expenseCutPct": 71}}"#)
            .expect_err("must reject cut over 70");
        assert!(err.contains("scenario.expenseCutPct"));

        let err = analysis_request_from_json(r#"{"scenario": {"incomeStartMonth": 61}}"#)
            .expect_err("must reject step month over 60");
        assert!(err.contains("scenario.incomeStartMonth"));
    }

    #[test]
    fn analyze_request_rejects_invalid_news_event() {
        let err = analysis_request_from_json(r#"{"newsEvent": {"riskDelta": 15}}"#)
            .expect_err("must require a headline");
        assert!(err.contains("newsEvent.headline"));

        let err =
            analysis_request_from_json(r#"{"newsEvent": {"headline": "x", "riskDelta": 51}}"#)
                .expect_err("must reject delta over 50");
        assert!(err.contains("newsEvent.riskDelta"));
    }

    #[test]
    fn scenario_allows_negative_income_change() {
        let request =
            analysis_request_from_json(r#"{"scenario": {"incomeChangeMonthly": -400}}"#)
                .expect("signed field is valid");
        assert_approx(request.scenario.income_change_monthly, -400.0);
    }

    #[test]
    fn savings_total_rounds_subscription_sum() {
        let subscriptions = vec![
            Subscription {
                name: "Streaming".to_string(),
                monthly_cost: 15.99,
            },
            Subscription {
                name: "Gym".to_string(),
                monthly_cost: 29.52,
            },
        ];
        assert_approx(savings_total(&subscriptions), 45.51);
    }

    #[test]
    fn what_if_request_parses_custom_scenarios() {
        let json = r#"{
          "incomeMonthly": 3000,
          "expensesMonthly": 2500,
          "savings": 10000,
          "customScenarios": [
            {"name": "rent_doubles", "incomeFactor": 1.0, "expenseFactor": 2.0}
          ]
        }"#;
        let request = what_if_request_from_json(json).expect("json should parse");
        assert_approx(request.income_monthly, 3_000.0);
        assert_eq!(request.custom_scenarios.len(), 1);
        assert_eq!(request.custom_scenarios[0].name, "rent_doubles");
    }

    #[test]
    fn what_if_request_rejects_unnamed_custom_scenarios() {
        let err = what_if_request_from_json(r#"{"customScenarios": [{"incomeFactor": 1.0}]}"#)
            .expect_err("must require scenario names");
        assert!(err.contains("customScenarios.name"));
    }

    #[test]
    fn analyze_response_serialization_contains_expected_fields() {
        let request = analysis_request_from_json(
            r#"{
              "profile": {"incomeMonthly": 5200, "expensesMonthly": 3400, "savings": 12000, "debt": 15000, "industry": "Tech"},
              "scenario": {"monthsUnemployed": 6, "expenseCutPct": 15, "severance": 3000},
              "subscriptions": [{"name": "Streaming", "monthlyCost": 12.0}]
            }"#,
        )
        .expect("valid request");

        let analysis = run_analysis(
            &request.profile,
            &request.scenario,
            request.news_event.as_ref(),
        );
        let response = AnalyzeResponse {
            metrics: analysis.metrics,
            timeline: analysis.timeline,
            savings_total: savings_total(&request.subscriptions),
            alert: analysis.alert,
            summary: "summary text".to_string(),
        };
        let json = serde_json::to_string(&response).expect("response should serialize");
        assert!(json.contains("\"metrics\""));
        assert!(json.contains("\"monthlyExpensesCut\""));
        assert!(json.contains("\"runwayMonths\""));
        assert!(json.contains("\"adjustedRiskScore\""));
        assert!(json.contains("\"timeline\""));
        assert!(json.contains("\"savingsTotal\":12.0"));
        assert!(json.contains("\"alert\""));
        assert!(json.contains("\"summary\":\"summary text\""));
    }

    #[test]
    fn what_if_report_serialization_contains_expected_fields() {
        let report = run_what_if(3_000.0, 2_500.0, 10_000.0, &[]);
        let json = serde_json::to_string(&report).expect("report should serialize");
        assert!(json.contains("\"baseline\""));
        assert!(json.contains("\"scenarios\""));
        assert!(json.contains("\"job_loss\""));
        assert!(json.contains("\"runwayChangePct\""));
        assert!(json.contains("\"incomeFactor\""));
        assert!(json.contains("\"count\":5"));
    }
}
