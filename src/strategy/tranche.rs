use crate::forecast::ForecastPoint;
use crate::indicators::{mean, percentile, std_dev};
use crate::models::round_to;
use crate::{Result, ServiceError};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TrancheAction {
    #[serde(rename = "BUY NOW")]
    BuyNow,
    #[serde(rename = "WAIT")]
    Wait,
    #[serde(rename = "DOLLAR COST AVERAGE")]
    DollarCostAverage,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    High,
    Medium,
    Low,
}

/// One slice of a procurement volume
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tranche {
    pub action: TrancheAction,
    pub percentage: u32,
    pub reason: String,
    pub target_price: f64,
    pub urgency: Urgency,
    pub volume_mwh: f64,
    pub estimated_cost: f64,
    pub delivery_period: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastLow {
    pub price: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranchePlan {
    pub delivery_period: String,
    pub total_volume_mwh: f64,
    pub current_price: f64,
    pub forecast_low: ForecastLow,
    pub recommendations: Vec<Tranche>,
}

/// Reject zero, negative and non-finite quantities
pub fn ensure_positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ServiceError::InvalidInput(format!(
            "{} must be a positive number, got {}",
            name, value
        )))
    }
}

/// Split a procurement volume into tranches based on where the forecast bottoms out
///
/// - current price within 2% of the forecast low: buy half now
/// - forecast low more than 5% under today: wait with 70%, buy 30% as a hedge
/// - otherwise: buy a quarter each week
pub fn recommend_tranches(
    current_price: f64,
    forecast: &[ForecastPoint],
    volume_mwh: f64,
    delivery_period: &str,
) -> Result<TranchePlan> {
    ensure_positive("volume", volume_mwh)?;

    let low = forecast
        .iter()
        .min_by(|a, b| a.predicted.total_cmp(&b.predicted))
        .ok_or(ServiceError::InsufficientData { needed: 1, got: 0 })?;
    let min_price = low.predicted;

    let mut slices: Vec<(TrancheAction, u32, String, f64, Urgency)> = Vec::new();

    if current_price <= min_price * 1.02 {
        slices.push((
            TrancheAction::BuyNow,
            50,
            "Current price near forecast minimum. Lock in 50% of requirement.".to_string(),
            current_price,
            Urgency::High,
        ));
    } else if min_price < current_price * 0.95 {
        slices.push((
            TrancheAction::Wait,
            70,
            format!(
                "Price expected to drop to {:.2} around {}. Wait for better entry.",
                min_price,
                low.date.format("%Y-%m-%d")
            ),
            min_price,
            Urgency::Low,
        ));
        slices.push((
            TrancheAction::BuyNow,
            30,
            "Secure 30% now to reduce risk if forecast is wrong.".to_string(),
            current_price,
            Urgency::Medium,
        ));
    } else {
        slices.push((
            TrancheAction::DollarCostAverage,
            25,
            "Market stable. Buy 25% weekly to average out price fluctuations.".to_string(),
            current_price,
            Urgency::Medium,
        ));
    }

    let recommendations = slices
        .into_iter()
        .map(|(action, percentage, reason, target_price, urgency)| {
            let volume = volume_mwh * percentage as f64 / 100.0;
            Tranche {
                action,
                percentage,
                reason,
                target_price: round_to(target_price, 2),
                urgency,
                volume_mwh: round_to(volume, 3),
                estimated_cost: round_to(volume * target_price, 2),
                delivery_period: delivery_period.to_string(),
            }
        })
        .collect();

    Ok(TranchePlan {
        delivery_period: delivery_period.to_string(),
        total_volume_mwh: volume_mwh,
        current_price: round_to(current_price, 2),
        forecast_low: ForecastLow {
            price: round_to(min_price, 2),
            date: low.date,
        },
        recommendations,
    })
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractChoice {
    Flexible,
    Fixed,
    Hybrid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub recommendation: ContractChoice,
    pub confidence: f64,
    pub reason: String,
    pub fixed_rate: f64,
    pub fixed_annual_cost: f64,
    pub flexible_expected: f64,
    pub flexible_std: f64,
    pub flexible_expected_annual: f64,
    pub flexible_best_case: f64,
    pub flexible_worst_case: f64,
    pub savings_potential_pct: f64,
    pub risk_pct: f64,
}

/// Compare a fixed-rate contract against buying at forecast prices
///
/// Best and worst flexible cases are the 10th and 90th percentile of the
/// forecast. Flexible wins when it saves more than 5% with under 10% downside.
pub fn compare_fixed_vs_flexible(
    fixed_rate: f64,
    predictions: &[f64],
    annual_volume_mwh: f64,
) -> Result<ContractAnalysis> {
    ensure_positive("fixed rate", fixed_rate)?;
    ensure_positive("annual volume", annual_volume_mwh)?;

    let expected = mean(predictions).ok_or(ServiceError::InsufficientData { needed: 1, got: 0 })?;
    let best = percentile(predictions, 10.0).unwrap_or(expected);
    let worst = percentile(predictions, 90.0).unwrap_or(expected);

    let fixed_annual = fixed_rate * annual_volume_mwh;
    let expected_annual = expected * annual_volume_mwh;
    let best_annual = best * annual_volume_mwh;
    let worst_annual = worst * annual_volume_mwh;

    let savings = (fixed_annual - expected_annual) / fixed_annual * 100.0;
    let risk = if expected_annual != 0.0 {
        (worst_annual - expected_annual) / expected_annual * 100.0
    } else {
        0.0
    };

    let (recommendation, confidence, reason) = if savings > 5.0 && risk < 10.0 {
        (
            ContractChoice::Flexible,
            (savings / 10.0).min(0.9),
            format!(
                "Flexible purchasing expected to save {:.1}% with manageable risk ({:.1}% downside).",
                savings, risk
            ),
        )
    } else if savings < -2.0 {
        (
            ContractChoice::Fixed,
            0.8,
            format!(
                "Fixed rate offers better value. Flexible would cost {:.1}% more.",
                savings.abs()
            ),
        )
    } else {
        (
            ContractChoice::Hybrid,
            0.6,
            format!(
                "Consider 50/50 split. Savings potential ({:.1}%) similar to risk ({:.1}%).",
                savings, risk
            ),
        )
    };

    tracing::info!(
        "Fixed vs flexible: {:?} (savings {:.1}%, risk {:.1}%)",
        recommendation,
        savings,
        risk
    );

    Ok(ContractAnalysis {
        recommendation,
        confidence: round_to(confidence, 2),
        reason,
        fixed_rate,
        fixed_annual_cost: round_to(fixed_annual, 2),
        flexible_expected: round_to(expected, 2),
        flexible_std: round_to(std_dev(predictions), 2),
        flexible_expected_annual: round_to(expected_annual, 2),
        flexible_best_case: round_to(best_annual, 2),
        flexible_worst_case: round_to(worst_annual, 2),
        savings_potential_pct: round_to(savings, 2),
        risk_pct: round_to(risk, 2),
    })
}
