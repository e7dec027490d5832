use actix_web::{get, post, web, HttpResponse, Responder};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::initialization::Config;
use crate::manager_blueprint::Blueprint;
use crate::manager_blueprint::errors::BlueprintError;
use crate::manager_rainfall::Rainfall;
use crate::manager_sizing::{assess, payback_years, savings_projection, water_balance};
use crate::models::{AssessmentInput, AssessmentReport, Coordinates, DataItem, Location, RainfallOutcome, RooftopType, SavingsPoint};

const PROJECTION_YEARS: u32 = 10;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    pub project_name: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub family_members: Option<String>,
    pub roof_length: Option<String>,
    pub roof_width: Option<String>,
    pub rooftop_type: Option<String>,
    pub tank_space_length: Option<String>,
    pub tank_space_width: Option<String>,
}

impl Params {
    /// Validates the raw query parameters into an assessment input
    pub fn to_input(&self) -> Result<AssessmentInput, String> {
        let family_members = required("familyMembers", &self.family_members)?
            .parse::<u32>()
            .map_err(|_| "familyMembers must be a whole number".to_string())?;
        if family_members == 0 {
            return Err("familyMembers must be at least 1".to_string());
        }

        Ok(AssessmentInput {
            project_name: self.project_name.clone().unwrap_or_default(),
            location: self.location.clone().unwrap_or_default(),
            family_members,
            roof_length: positive("roofLength", required("roofLength", &self.roof_length)?)?,
            roof_width: positive("roofWidth", required("roofWidth", &self.roof_width)?)?,
            rooftop_type: RooftopType::from(self.rooftop_type.as_deref().unwrap_or_default()),
            tank_space_length: optional_positive("tankSpaceLength", &self.tank_space_length)?,
            tank_space_width: optional_positive("tankSpaceWidth", &self.tank_space_width)?,
        })
    }

    /// Validates the explicit coordinates and combines them with the location text
    pub fn to_location(&self) -> Result<Location, String> {
        let lat = optional_coordinate("latitude", &self.latitude, 90.0)?;
        let lon = optional_coordinate("longitude", &self.longitude, 180.0)?;

        Ok(Location::from_parts(self.location.as_deref().unwrap_or_default(), lat, lon))
    }
}

fn required<'a>(name: &str, value: &'a Option<String>) -> Result<&'a str, String> {
    match value.as_deref().map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("{} is required", name)),
    }
}

fn positive(name: &str, value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(format!("{} must be a positive number", name)),
    }
}

fn optional_positive(name: &str, value: &Option<String>) -> Result<Option<f64>, String> {
    match value.as_deref().map(|v| v.trim()) {
        Some(v) if !v.is_empty() => positive(name, v).map(Some),
        _ => Ok(None),
    }
}

fn optional_coordinate(name: &str, value: &Option<String>, limit: f64) -> Result<Option<f64>, String> {
    match value.as_deref().map(|v| v.trim()) {
        Some(v) if !v.is_empty() => match v.parse::<f64>() {
            Ok(c) if c.is_finite() && c.abs() <= limit => Ok(Some(c)),
            _ => Err(format!("{} must be a number between -{} and {}", name, limit, limit)),
        },
        _ => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintParams {
    pub blueprint_data_uri: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
pub struct Series {
    pub name: String,
    #[serde(rename(serialize = "type"))]
    pub chart_type: String,
    pub data: Vec<DataItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebData {
    report: AssessmentReport,
    coordinates: Coordinates,
    rainfall_source: String,
    rainfall_fallback_reason: Option<String>,
    payback_years: Option<f64>,
    water_balance: Series,
    cost_benefit: Vec<SavingsPoint>,
}

#[get("/assessment")]
pub async fn get_assessment(data: web::Data<AppState>, params: web::Query<Params>) -> impl Responder {
    let input = match params.to_input() {
        Ok(input) => input,
        Err(e) => return HttpResponse::BadRequest().json(ErrorBody { error: e }),
    };

    let location = match params.to_location() {
        Ok(location) => location,
        Err(e) => return HttpResponse::BadRequest().json(ErrorBody { error: e }),
    };

    let coordinates = resolve_coordinates(&data.config, &location);
    let rainfall = get_rainfall(&data.config, coordinates).await;

    info!("assessing '{}' at {}, {} with {} mm ({})",
        input.project_name, coordinates.lat, coordinates.lon, rainfall.value(), rainfall_source(&rainfall));

    debug!("tank space {:?} x {:?} m not used for sizing", input.tank_space_length, input.tank_space_width);

    let report = assess(&input, rainfall.value(), &data.config.policy);

    HttpResponse::Ok().json(WebData {
        water_balance: Series {
            name: "Water Volume".to_string(),
            chart_type: "radar".to_string(),
            data: water_balance(&report),
        },
        cost_benefit: savings_projection(&report, PROJECTION_YEARS),
        payback_years: payback_years(&report),
        report,
        coordinates,
        rainfall_source: rainfall_source(&rainfall).to_string(),
        rainfall_fallback_reason: match rainfall {
            RainfallOutcome::Fallback { reason, .. } => Some(reason),
            RainfallOutcome::Resolved(_) => None,
        },
    })
}

#[post("/blueprint/dimensions")]
pub async fn post_blueprint_dimensions(data: web::Data<AppState>, params: web::Json<BlueprintParams>) -> impl Responder {
    let blueprint = match Blueprint::new(&data.config.blueprint) {
        Ok(blueprint) => blueprint,
        Err(e) => {
            error!("unable to create blueprint client: {}", e);
            return HttpResponse::InternalServerError().json(ErrorBody { error: e.to_string() });
        }
    };

    match blueprint.extract_dimensions(&params.blueprint_data_uri).await {
        Ok(dimensions) => HttpResponse::Ok().json(dimensions),
        Err(e) => {
            error!("blueprint extraction failed: {}", e);
            match &e {
                BlueprintError::Input(_) => HttpResponse::BadRequest().json(ErrorBody { error: e.to_string() }),
                _ => HttpResponse::BadGateway().json(ErrorBody { error: e.to_string() }),
            }
        }
    }
}

#[get("/health")]
pub async fn get_health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}

/// Returns coordinates for the location, place names fall back to the configured default
///
/// # Arguments
///
/// * 'config' - configuration holding the default coordinates
/// * 'location' - location given by the caller
fn resolve_coordinates(config: &Config, location: &Location) -> Coordinates {
    match location {
        Location::Coordinates(coordinates) => *coordinates,
        Location::PlaceName(name) => {
            warn!("no geocoding for '{}', using default coordinates", name);
            config.geo_ref.coordinates()
        }
    }
}

async fn get_rainfall(config: &Config, coordinates: Coordinates) -> RainfallOutcome {
    match Rainfall::new(&config.rainfall) {
        Ok(rainfall) => rainfall.resolve(coordinates, &config.files.cache_dir).await,
        Err(e) => {
            warn!("unable to create rainfall client, using fallback: {}", e);
            RainfallOutcome::Fallback { mm: config.rainfall.fallback_mm, reason: e.to_string() }
        }
    }
}

fn rainfall_source(rainfall: &RainfallOutcome) -> &'static str {
    if rainfall.is_fallback() { "fallback" } else { "resolved" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::test::{call_and_read_body, call_and_read_body_json, call_service, init_service, read_body_json, TestRequest};
    use serde_json::Value;
    use tempfile::TempDir;

    fn state(tmp: &TempDir) -> web::Data<AppState> {
        let mut config = Config::default();
        config.rainfall.base_url = "http://127.0.0.1:9/v1/archive".to_string();
        config.rainfall.timeout_secs = 5;
        config.blueprint.base_url = "http://127.0.0.1:9/v1beta".to_string();
        config.blueprint.timeout_secs = 5;
        config.files.cache_dir = format!("{}/", tmp.path().display());

        web::Data::new(AppState { config })
    }

    fn params(query: &str) -> Params {
        web::Query::<Params>::from_query(query).unwrap().into_inner()
    }

    #[test]
    fn valid_params_become_input() {
        let input = params("projectName=Villa&location=Delhi&familyMembers=4&roofLength=15&roofWidth=10&rooftopType=flat&tankSpaceLength=3&tankSpaceWidth=2")
            .to_input()
            .unwrap();

        assert_eq!(input.family_members, 4);
        assert_eq!(input.roof_length, 15.0);
        assert_eq!(input.rooftop_type, RooftopType::Flat);
        assert_eq!(input.tank_space_width, Some(2.0));
    }

    #[test]
    fn missing_type_and_tank_space_are_accepted() {
        let input = params("familyMembers=2&roofLength=8&roofWidth=6").to_input().unwrap();
        assert_eq!(input.rooftop_type, RooftopType::Other);
        assert_eq!(input.tank_space_length, None);
        assert_eq!(input.project_name, "");
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(params("familyMembers=0&roofLength=8&roofWidth=6").to_input().is_err());
        assert!(params("familyMembers=two&roofLength=8&roofWidth=6").to_input().is_err());
        assert!(params("familyMembers=2&roofLength=-8&roofWidth=6").to_input().is_err());
        assert!(params("familyMembers=2&roofLength=abc&roofWidth=6").to_input().is_err());
        assert!(params("familyMembers=2&roofWidth=6").to_input().is_err());
        assert!(params("familyMembers=2&roofLength=8&roofWidth=6&tankSpaceWidth=0").to_input().is_err());

        let err = params("familyMembers=2&roofLength=8&roofWidth=NaN").to_input().unwrap_err();
        assert_eq!(err, "roofWidth must be a positive number");
    }

    #[test]
    fn explicit_coordinates_are_validated() {
        let location = params("location=Pune&latitude=18.52&longitude=%2073.85").to_location().unwrap();
        assert_eq!(location, Location::Coordinates(Coordinates { lat: 18.52, lon: 73.85 }));

        let location = params("location=Pune&latitude=&longitude=73.85").to_location().unwrap();
        assert_eq!(location, Location::PlaceName("Pune".to_string()));

        let err = params("location=Pune&latitude=north&longitude=73.85").to_location().unwrap_err();
        assert_eq!(err, "latitude must be a number between -90 and 90");
        assert!(params("latitude=18.5&longitude=inf").to_location().is_err());
        assert!(params("latitude=91&longitude=73.85").to_location().is_err());
        assert!(params("latitude=18.5&longitude=-180.5").to_location().is_err());
    }

    #[actix_web::test]
    async fn assessment_with_unreachable_archive_uses_fallback() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(get_assessment)).await;

        let req = TestRequest::get()
            .uri("/assessment?projectName=Green%20Villa&location=28.61390,%2077.20900&familyMembers=4&roofLength=15&roofWidth=10&rooftopType=flat&tankSpaceLength=3&tankSpaceWidth=2")
            .to_request();
        let body: Value = call_and_read_body_json(&app, req).await;

        assert_eq!(body["rainfallSource"], "fallback");
        assert!(body["rainfallFallbackReason"].is_string());
        assert_eq!(body["coordinates"]["lat"], 28.6139);

        let report = &body["report"];
        assert_eq!(report["projectName"], "Green Villa");
        assert_eq!(report["rooftopArea"], 150.0);
        assert_eq!(report["waterCollectionEstimate"], 84000.0);
        assert_eq!(report["annualDemand"], 197100.0);
        assert_eq!(report["optimalTankSize"], 5400.0);
        assert_eq!(report["groundwaterRechargePotential"], 78600.0);
        assert_eq!(report["costEstimation"]["investment"], 21600.0);
        assert_eq!(report["costEstimation"]["annualSavings"], 1680.0);
        assert_eq!(report["localRainfall"], 800.0);
        assert_eq!(report["feasibility"], "YES");

        assert_eq!(body["waterBalance"]["type"], "radar");
        assert_eq!(body["waterBalance"]["data"][2]["value"], 5400.0);
        assert_eq!(body["costBenefit"].as_array().unwrap().len(), 10);
        assert_eq!(body["costBenefit"][9]["cumulativeSavings"], 16800.0);
        assert_eq!(body["paybackYears"], 12.9);
    }

    #[actix_web::test]
    async fn invalid_assessment_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(get_assessment)).await;

        let req = TestRequest::get()
            .uri("/assessment?familyMembers=3&roofLength=0&roofWidth=10")
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["error"], "roofLength must be a positive number");
    }

    #[actix_web::test]
    async fn unparsable_latitude_is_bad_request_with_json_error() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(get_assessment)).await;

        let req = TestRequest::get()
            .uri("/assessment?location=Delhi&latitude=north&longitude=77.2&familyMembers=3&roofLength=8&roofWidth=10")
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
        let body: Value = read_body_json(resp).await;
        assert_eq!(body["error"], "latitude must be a number between -90 and 90");
    }

    #[actix_web::test]
    async fn explicit_coordinates_are_used_for_the_lookup() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(get_assessment)).await;

        let req = TestRequest::get()
            .uri("/assessment?location=Somewhere&latitude=12.97&longitude=77.59&familyMembers=2&roofLength=8&roofWidth=10")
            .to_request();
        let body: Value = call_and_read_body_json(&app, req).await;

        assert_eq!(body["coordinates"]["lat"], 12.97);
        assert_eq!(body["coordinates"]["lon"], 77.59);
        assert_eq!(body["rainfallSource"], "fallback");
    }

    #[actix_web::test]
    async fn place_name_uses_default_coordinates() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(get_assessment)).await;

        let req = TestRequest::get()
            .uri("/assessment?location=Jaipur&latitude=26.9&familyMembers=1&roofLength=5&roofWidth=5&rooftopType=metal")
            .to_request();
        let body: Value = call_and_read_body_json(&app, req).await;

        assert_eq!(body["coordinates"]["lat"], 28.6139);
        assert_eq!(body["coordinates"]["lon"], 77.209);
        assert_eq!(body["report"]["waterCollectionEstimate"], 18000.0);
        assert_eq!(body["report"]["optimalTankSize"], 1350.0);
    }

    #[actix_web::test]
    async fn malformed_blueprint_is_bad_request() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(post_blueprint_dimensions)).await;

        let req = TestRequest::post()
            .uri("/blueprint/dimensions")
            .set_json(serde_json::json!({ "blueprintDataUri": "not-a-data-uri" }))
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn unreachable_vision_service_is_bad_gateway() {
        let tmp = TempDir::new().unwrap();
        let app = init_service(App::new().app_data(state(&tmp)).service(post_blueprint_dimensions)).await;

        let req = TestRequest::post()
            .uri("/blueprint/dimensions")
            .set_json(serde_json::json!({ "blueprintDataUri": "data:image/png;base64,iVBORw0KGgo=" }))
            .to_request();
        let resp = call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_GATEWAY);
        let body: Value = read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("BlueprintError::Service"));
    }

    #[actix_web::test]
    async fn health_answers_ok() {
        let app = init_service(App::new().service(get_health)).await;
        let req = TestRequest::get().uri("/health").to_request();
        let body = call_and_read_body(&app, req).await;
        assert_eq!(body, "ok");
    }
}
