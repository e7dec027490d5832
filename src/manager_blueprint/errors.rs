use std::fmt;
use std::fmt::Formatter;

#[derive(Debug)]
pub enum BlueprintError {
    Service(String),
    Document(String),
    Input(String),
}

impl fmt::Display for BlueprintError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BlueprintError::Service(e)  => write!(f, "BlueprintError::Service: {}", e),
            BlueprintError::Document(e) => write!(f, "BlueprintError::Document: {}", e),
            BlueprintError::Input(e)    => write!(f, "BlueprintError::Input: {}", e),
        }
    }
}
impl From<reqwest::Error> for BlueprintError {
    fn from(e: reqwest::Error) -> BlueprintError {
        BlueprintError::Service(e.to_string())
    }
}
impl From<serde_json::Error> for BlueprintError {
    fn from(e: serde_json::Error) -> BlueprintError {
        BlueprintError::Document(e.to_string())
    }
}
