//! Application state management

use std::sync::Arc;

use crate::admission::AdmissionController;
use crate::config::Config;
use crate::export::{ExportError, SpreadsheetExporter};
use crate::normalize::{NormalizationRules, RulesError};
use crate::ocr::{OcrError, OcrProviderTrait, OcrSpaceProvider};
use crate::pipeline::OcrPipeline;
use crate::preprocess::AutoRotate;

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize OCR client: {0}")]
    Ocr(#[from] OcrError),

    #[error("Failed to load normalization rules: {0}")]
    Rules(#[from] RulesError),

    #[error("Failed to prepare export directory: {0}")]
    Export(#[from] ExportError),

    #[error("Failed to prepare upload directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pipeline: OcrPipeline,
}

impl AppState {
    /// Create the state with the OCR.space client built from `config`
    pub fn new(config: Config) -> Result<Self, StateError> {
        let provider = OcrSpaceProvider::new(&config.ocr)?;
        Self::with_provider(config, Arc::new(provider))
    }

    /// Create the state around an arbitrary OCR provider
    pub fn with_provider(
        config: Config,
        provider: Arc<dyn OcrProviderTrait>,
    ) -> Result<Self, StateError> {
        std::fs::create_dir_all(&config.storage.upload_dir)?;
        let exporter = SpreadsheetExporter::new(&config.storage.export_dir)?;

        let rules = match &config.normalization.rules_path {
            Some(path) => {
                let rules = NormalizationRules::from_file(path)?;
                tracing::info!(path = %path.display(), rules = rules.len(), "Loaded normalization rules");
                rules
            }
            None => NormalizationRules::builtin(),
        };

        let mut pipeline = OcrPipeline::new(
            AdmissionController::from_config(&config.admission),
            provider,
            Arc::new(rules),
            exporter,
            config.storage.upload_dir.clone(),
        );
        if config.ocr.auto_rotate {
            pipeline = pipeline.with_preprocessor(Arc::new(AutoRotate));
        }

        Ok(Self {
            inner: Arc::new(AppStateInner { config, pipeline }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the OCR pipeline
    pub fn pipeline(&self) -> &OcrPipeline {
        &self.inner.pipeline
    }

    /// Get the spreadsheet exporter
    pub fn exporter(&self) -> &SpreadsheetExporter {
        self.inner.pipeline.exporter()
    }
}
