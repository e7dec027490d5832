use serde::Deserialize;
use crate::models::{AssessmentInput, AssessmentReport, CostEstimation, DataItem, RooftopType, SavingsPoint};

const FEASIBILITY: &str = "YES";
const CONFIDENCE_SCORE: f64 = 95.2;
const CONFIDENCE_REASON: &str = "Based on high rainfall & sufficient rooftop area.";
const STRUCTURE_TYPE: &str = "Rooftop Rainwater Harvesting with Recharge Pit";
const TANK_MATERIAL: &str = "RCC (Reinforced Cement Concrete)";

/// Runoff coefficient per roof material
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RunoffCoefficients {
    pub flat: f64,
    pub sloped: f64,
    pub tiled: f64,
    pub metal: f64,
    pub default: f64,
}

impl Default for RunoffCoefficients {
    fn default() -> Self {
        Self { flat: 0.70, sloped: 0.80, tiled: 0.85, metal: 0.90, default: 0.80 }
    }
}

impl RunoffCoefficients {
    /// Returns the runoff coefficient for the given roof type, never fails
    ///
    /// # Arguments
    ///
    /// * 'rooftop_type' - roof material
    pub fn lookup(&self, rooftop_type: RooftopType) -> f64 {
        match rooftop_type {
            RooftopType::Flat => self.flat,
            RooftopType::Sloped => self.sloped,
            RooftopType::Tiled => self.tiled,
            RooftopType::Metal => self.metal,
            RooftopType::Other => self.default,
        }
    }
}

/// Tariffs, demand figures and tank ceilings used by the sizing engine
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SizingPolicy {
    pub runoff: RunoffCoefficients,
    /// Liters per person per day
    pub per_capita_demand_lpd: f64,
    pub reserve_days: f64,
    pub days_per_year: f64,
    /// Largest share of the annual harvest a tank may hold
    pub harvest_storage_fraction: f64,
    pub max_tank_liters: f64,
    /// Cost of one cubic meter of RCC tank capacity
    pub storage_cost_per_m3: f64,
    /// Municipal price of 1000 liters
    pub water_price_per_kl: f64,
    pub groundwater_level_m: f64,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            runoff: RunoffCoefficients::default(),
            per_capita_demand_lpd: 135.0,
            reserve_days: 10.0,
            days_per_year: 365.0,
            harvest_storage_fraction: 0.2,
            max_tank_liters: 50000.0,
            storage_cost_per_m3: 4000.0,
            water_price_per_kl: 20.0,
            groundwater_level_m: 10.0,
        }
    }
}

/// Computes the feasibility report for one building
///
/// Input is expected to be validated, i.e. positive geometry and at least one
/// family member. Rounding is applied to the reported figures only.
///
/// # Arguments
///
/// * 'input' - building and household data
/// * 'annual_rainfall_mm' - rainfall over one year in mm
/// * 'policy' - tariffs and ceilings to size with
pub fn assess(input: &AssessmentInput, annual_rainfall_mm: f64, policy: &SizingPolicy) -> AssessmentReport {
    let rooftop_area = input.roof_length * input.roof_width;
    let runoff_coefficient = policy.runoff.lookup(input.rooftop_type);

    // mm to m for the area product, then m³ to liters
    let water_collection_estimate = rooftop_area * (annual_rainfall_mm / 1000.0) * runoff_coefficient * 1000.0;

    let daily_demand = input.family_members as f64 * policy.per_capita_demand_lpd;
    let annual_demand = daily_demand * policy.days_per_year;
    let tank_capacity_from_demand = daily_demand * policy.reserve_days;

    let tank_size = (water_collection_estimate * policy.harvest_storage_fraction)
        .min(tank_capacity_from_demand)
        .min(policy.max_tank_liters);

    let surplus = (water_collection_estimate - tank_size).max(0.0);

    let investment = (tank_size / 1000.0) * policy.storage_cost_per_m3;
    let annual_savings = (water_collection_estimate / 1000.0) * policy.water_price_per_kl;

    AssessmentReport {
        project_name: input.project_name.clone(),
        location: input.location.clone(),
        feasibility: FEASIBILITY.to_string(),
        confidence_score: CONFIDENCE_SCORE,
        confidence_reason: CONFIDENCE_REASON.to_string(),
        structure_type: STRUCTURE_TYPE.to_string(),
        tank_material: TANK_MATERIAL.to_string(),
        rooftop_area,
        water_collection_estimate: water_collection_estimate.round(),
        annual_demand: annual_demand.round(),
        optimal_tank_size: tank_size.round(),
        groundwater_recharge_potential: surplus.round(),
        cost_estimation: CostEstimation {
            investment: investment.round(),
            annual_savings: annual_savings.round(),
        },
        local_rainfall: annual_rainfall_mm.round(),
        groundwater_level: policy.groundwater_level_m,
    }
}

/// Returns the yearly cumulative savings set against the one-off investment
///
/// # Arguments
///
/// * 'report' - a computed assessment
/// * 'years' - number of years to project
pub fn savings_projection(report: &AssessmentReport, years: u32) -> Vec<SavingsPoint> {
    (1..=years)
        .map(|year| SavingsPoint {
            year,
            cumulative_savings: report.cost_estimation.annual_savings * year as f64,
            initial_investment: report.cost_estimation.investment,
        })
        .collect::<Vec<SavingsPoint>>()
}

/// Returns the years until savings repay the investment, to one decimal
///
/// None when the roof saves nothing, there is no break-even then
///
/// # Arguments
///
/// * 'report' - a computed assessment
pub fn payback_years(report: &AssessmentReport) -> Option<f64> {
    let cost = &report.cost_estimation;
    if cost.annual_savings.is_nan() || cost.annual_savings <= 0.0 {
        return None;
    }

    Some((cost.investment / cost.annual_savings * 10.0).round() / 10.0)
}

/// Returns the yearly water balance as named volumes
///
/// # Arguments
///
/// * 'report' - a computed assessment
pub fn water_balance(report: &AssessmentReport) -> Vec<DataItem> {
    [
        ("Harvested", report.water_collection_estimate),
        ("Demand", report.annual_demand),
        ("Stored", report.optimal_tank_size),
        ("Recharged", report.groundwater_recharge_potential),
    ]
        .into_iter()
        .map(|(name, value)| DataItem { name: name.to_string(), value })
        .collect::<Vec<DataItem>>()
}
