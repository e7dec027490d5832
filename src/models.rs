use serde::{Deserialize, Serialize};

/// Roof surface material, drives the runoff coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RooftopType {
    Flat,
    Sloped,
    Tiled,
    Metal,
    Other,
}

impl From<&str> for RooftopType {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "flat" => RooftopType::Flat,
            "sloped" => RooftopType::Sloped,
            "tiled" => RooftopType::Tiled,
            "metal" => RooftopType::Metal,
            _ => RooftopType::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Where the building is, either as coordinates or as a place name that
/// still needs geocoding
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Coordinates(Coordinates),
    PlaceName(String),
}

impl Location {
    /// Builds a location from explicit coordinates when both are given, otherwise
    /// tries the legacy "lat, lon" text form before treating the text as a place name
    ///
    /// # Arguments
    ///
    /// * 'text' - free text location as entered by the user
    /// * 'lat' - optional explicit latitude
    /// * 'lon' - optional explicit longitude
    pub fn from_parts(text: &str, lat: Option<f64>, lon: Option<f64>) -> Self {
        if let (Some(lat), Some(lon)) = (lat, lon) {
            return Location::Coordinates(Coordinates { lat, lon });
        }

        let parts = text.split(',').map(|p| p.trim()).collect::<Vec<&str>>();
        if parts.len() == 2 {
            if let (Ok(lat), Ok(lon)) = (parts[0].parse::<f64>(), parts[1].parse::<f64>()) {
                return Location::Coordinates(Coordinates { lat, lon });
            }
        }

        Location::PlaceName(text.trim().to_string())
    }
}

/// Validated caller input for one assessment
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentInput {
    pub project_name: String,
    pub location: String,
    pub family_members: u32,
    pub roof_length: f64,
    pub roof_width: f64,
    pub rooftop_type: RooftopType,
    /// Accepted but not consulted by sizing
    pub tank_space_length: Option<f64>,
    pub tank_space_width: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimation {
    pub investment: f64,
    pub annual_savings: f64,
}

/// Result of one assessment, volumes in liters and money in currency units
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentReport {
    pub project_name: String,
    pub location: String,
    pub feasibility: String,
    pub confidence_score: f64,
    pub confidence_reason: String,
    pub structure_type: String,
    pub tank_material: String,
    pub rooftop_area: f64,
    pub water_collection_estimate: f64,
    pub annual_demand: f64,
    pub optimal_tank_size: f64,
    pub groundwater_recharge_potential: f64,
    pub cost_estimation: CostEstimation,
    pub local_rainfall: f64,
    pub groundwater_level: f64,
}

/// Annual rainfall in mm, tagged with whether it came from the archive or is the fallback
#[derive(Debug, Clone, PartialEq)]
pub enum RainfallOutcome {
    Resolved(f64),
    Fallback { mm: f64, reason: String },
}

impl RainfallOutcome {
    pub fn value(&self) -> f64 {
        match self {
            RainfallOutcome::Resolved(mm) => *mm,
            RainfallOutcome::Fallback { mm, .. } => *mm,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RainfallOutcome::Fallback { .. })
    }
}

/// Roof length and width in meters as read off a blueprint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofDimensions {
    pub length: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataItem {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsPoint {
    pub year: u32,
    pub cumulative_savings: f64,
    pub initial_investment: f64,
}
