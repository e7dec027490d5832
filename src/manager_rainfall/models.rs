use serde::Deserialize;

#[derive(Deserialize)]
pub struct DailySeries {
    pub precipitation_sum: Vec<Option<f64>>,
}

#[derive(Deserialize)]
pub struct ArchiveResponse {
    pub daily: DailySeries,
}
