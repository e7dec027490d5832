use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub struct RainfallError(pub String);
impl fmt::Display for RainfallError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "RainfallError: {}", self.0)
    }
}
impl From<&str> for RainfallError {
    fn from(e: &str) -> Self { RainfallError(e.to_string()) }
}
impl From<reqwest::Error> for RainfallError {
    fn from(e: reqwest::Error) -> Self { RainfallError(e.to_string()) }
}
impl From<serde_json::Error> for RainfallError {
    fn from(e: serde_json::Error) -> Self { RainfallError(e.to_string()) }
}
