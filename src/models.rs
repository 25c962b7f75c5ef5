use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::extraction::Extractors;
use crate::upload::UploadLedger;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractors: Extractors,
    pub uploads: Arc<UploadLedger>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_extractors(config, Extractors::default())
    }

    pub fn with_extractors(config: Config, extractors: Extractors) -> Self {
        Self {
            config: Arc::new(config),
            extractors,
            uploads: Arc::new(UploadLedger::new()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractTextResponse {
    pub text: String,
}

impl ExtractTextResponse {
    /// Success body for a document that parsed but contained no text.
    pub fn nothing_extracted(filename: &str) -> Self {
        Self {
            text: format!("No text could be extracted from the {filename}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub detail: String,
}
