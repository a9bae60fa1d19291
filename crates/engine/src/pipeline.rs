//! Ingestion and query pipeline
//!
//! Transport-neutral operations surface: validates raw inputs, resolves the
//! modality, runs the matching encoder, tags the producing encoder in the
//! item metadata and delegates to the Index Service. HTTP or CLI adapters
//! call these operations and map errors with `XmodalError::status_code`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use xmodal_core::{
    CollectionState, ExtraMetadata, IndexStats, MetadataValue, Modality, SearchHit, XmodalError,
    XmodalResult, DEFAULT_MAX_UPLOAD_BYTES, DESCRIPTION_KEY, ENCODER_KEY, MAX_SEARCH_K,
    TEXT_MARKER_CHARS,
};

use crate::encoder::{EncoderAvailability, EncoderSet, RawInput};
use crate::service::{AddReceipt, IndexService};

/// Prefix of the synthetic source path recorded for text items
pub const TEXT_MARKER_PREFIX: &str = "text:";

/// One item to ingest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddRequest {
    /// File or text to embed
    pub input: RawInput,
    /// Declared modality; inferred from the input when absent
    #[serde(default)]
    pub modality: Option<Modality>,
    /// Caller-supplied attributes
    #[serde(default)]
    pub extra: ExtraMetadata,
}

impl AddRequest {
    /// Request for a file, modality inferred from its extension
    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        AddRequest {
            input: RawInput::File(path.into()),
            modality: None,
            extra: ExtraMetadata::new(),
        }
    }

    /// Request for free text
    pub fn text(text: impl Into<String>) -> Self {
        AddRequest {
            input: RawInput::Text(text.into()),
            modality: None,
            extra: ExtraMetadata::new(),
        }
    }

    /// Declare the modality explicitly
    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    /// Attach one attribute
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Per-item outcome inside a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItemResult {
    /// Item stored
    Ok {
        /// Position in the request list
        index: usize,
        /// Add outcome
        receipt: AddReceipt,
    },
    /// Item rejected; later items still ran
    Err {
        /// Position in the request list
        index: usize,
        /// Stable error code
        code: String,
        /// Human-readable message
        message: String,
    },
}

impl BatchItemResult {
    /// Whether the item was stored
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchItemResult::Ok { .. })
    }
}

/// Result of `batch_add`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Identifier for log correlation
    pub batch_id: Uuid,
    /// One entry per request, in request order
    pub items: Vec<BatchItemResult>,
    /// Items stored
    pub succeeded: usize,
    /// Items rejected
    pub failed: usize,
}

/// Service health snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// Which encoders are registered
    pub encoders: EncoderAvailability,
    /// Items in the collection
    pub indexed_items: usize,
    /// Collection lifecycle state
    pub state: CollectionState,
}

/// Input limits enforced before encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Largest accepted file, in bytes
    pub max_upload_bytes: u64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        PipelineOptions {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Operations surface over one Index Service
#[derive(Debug)]
pub struct Pipeline {
    service: Arc<IndexService>,
    encoders: EncoderSet,
    availability: EncoderAvailability,
    options: PipelineOptions,
}

impl Pipeline {
    /// Pipeline over `service` using `encoders`
    pub fn new(service: Arc<IndexService>, encoders: EncoderSet, options: PipelineOptions) -> Self {
        let availability = encoders.availability();
        info!(
            target: "xmodal::pipeline",
            collection = %service.name(),
            image = availability.image,
            audio = availability.audio,
            text = availability.text,
            "Pipeline ready"
        );
        Pipeline {
            service,
            encoders,
            availability,
            options,
        }
    }

    /// Underlying service
    pub fn service(&self) -> &Arc<IndexService> {
        &self.service
    }

    /// Validate, embed and store one item
    pub fn add(&self, request: AddRequest) -> XmodalResult<AddReceipt> {
        let modality = self.resolve_modality(&request.input, request.modality)?;
        let embedding = self.encoders.embed(modality, &request.input)?;

        let mut extra = request.extra;
        if let Some(encoder) = self.encoders.get(modality) {
            extra.insert(ENCODER_KEY.to_string(), encoder.name().into());
        }
        let source_path = match &request.input {
            RawInput::File(path) => path.to_string_lossy().into_owned(),
            RawInput::Text(text) => {
                extra
                    .entry(DESCRIPTION_KEY.to_string())
                    .or_insert_with(|| text.as_str().into());
                text_marker(text)
            }
        };

        self.service.add(&source_path, &embedding, modality, extra)
    }

    /// Add each request independently
    ///
    /// A failing item is recorded in the report and does not stop the
    /// batch; items stored before it stay stored.
    pub fn batch_add(&self, requests: Vec<AddRequest>) -> BatchReport {
        let batch_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(requests.len());
        let mut succeeded = 0;
        let mut failed = 0;

        for (index, request) in requests.into_iter().enumerate() {
            match self.add(request) {
                Ok(receipt) => {
                    succeeded += 1;
                    items.push(BatchItemResult::Ok { index, receipt });
                }
                Err(e) => {
                    failed += 1;
                    warn!(
                        target: "xmodal::pipeline",
                        batch_id = %batch_id,
                        index,
                        error = %e,
                        "Batch item rejected"
                    );
                    items.push(BatchItemResult::Err {
                        index,
                        code: e.kind().code().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            target: "xmodal::pipeline",
            batch_id = %batch_id,
            succeeded,
            failed,
            "Batch complete"
        );
        BatchReport {
            batch_id,
            items,
            succeeded,
            failed,
        }
    }

    /// Embed `query` and return the `k` most similar items of any modality
    pub fn search(&self, query: &RawInput, k: usize) -> XmodalResult<Vec<SearchHit>> {
        if k > MAX_SEARCH_K {
            return Err(XmodalError::validation(format!(
                "k must be at most {MAX_SEARCH_K}, got {k}"
            )));
        }
        let modality = self.resolve_modality(query, None)?;
        let embedding = self.encoders.embed(modality, query)?;
        let hits = self.service.search(&embedding, k)?;
        debug!(
            target: "xmodal::pipeline",
            modality = %modality,
            k,
            hits = hits.len(),
            "Query answered"
        );
        Ok(hits)
    }

    /// Collection statistics with the configured number of recent items
    pub fn stats(&self) -> IndexStats {
        self.service.stats(None)
    }

    /// Encoder availability and collection size
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            encoders: self.availability,
            indexed_items: self.service.len(),
            state: self.service.state(),
        }
    }

    /// Drop every item and delete the backing files
    pub fn reset(&self) -> XmodalResult<()> {
        self.service.reset()
    }

    /// Check the input against the hint and limits, returning the modality
    /// to embed with
    fn resolve_modality(&self, input: &RawInput, hint: Option<Modality>) -> XmodalResult<Modality> {
        if hint == Some(Modality::Unknown) {
            return Err(XmodalError::validation("modality must not be unknown"));
        }
        let modality = match input {
            RawInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(XmodalError::validation("text input is empty"));
                }
                match hint {
                    None | Some(Modality::Text) => Modality::Text,
                    Some(other) => {
                        return Err(XmodalError::validation(format!(
                            "text input cannot be indexed as {other}"
                        )))
                    }
                }
            }
            RawInput::File(path) => {
                if hint == Some(Modality::Text) {
                    return Err(XmodalError::validation(
                        "file input cannot be indexed as text",
                    ));
                }
                self.check_file(path)?;
                let inferred = Modality::from_path(path).ok_or_else(|| {
                    XmodalError::validation(format!(
                        "unsupported file type: {}",
                        path.display()
                    ))
                })?;
                match hint {
                    Some(declared) if declared != inferred => {
                        return Err(XmodalError::validation(format!(
                            "{} is not a valid {declared} file",
                            path.display()
                        )))
                    }
                    _ => inferred,
                }
            }
        };

        if !self.availability.supports(modality) {
            return Err(XmodalError::validation(format!(
                "no encoder available for modality {modality}"
            )));
        }
        Ok(modality)
    }

    fn check_file(&self, path: &Path) -> XmodalResult<()> {
        let meta = fs::metadata(path)
            .map_err(|_| XmodalError::validation(format!("file not found: {}", path.display())))?;
        if !meta.is_file() {
            return Err(XmodalError::validation(format!(
                "not a regular file: {}",
                path.display()
            )));
        }
        if meta.len() > self.options.max_upload_bytes {
            return Err(XmodalError::validation(format!(
                "file is {} bytes, limit is {}",
                meta.len(),
                self.options.max_upload_bytes
            )));
        }
        Ok(())
    }
}

/// Synthetic source path for a text item
pub fn text_marker(text: &str) -> String {
    let head: String = text.trim().chars().take(TEXT_MARKER_CHARS).collect();
    format!("{TEXT_MARKER_PREFIX}{head}")
}
