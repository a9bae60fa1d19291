//! Encoder seam
//!
//! Embedding producers are opaque: the engine only needs a name, the
//! modality an encoder handles, and `embed`. Encoders are registered once
//! at startup into an `EncoderSet`; availability is fixed from then on.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use xmodal_core::{Modality, XmodalError, XmodalResult};

/// Raw input handed to an encoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawInput {
    /// A file on disk (image or audio)
    File(PathBuf),
    /// Free text
    Text(String),
}

/// An embedding producer for one modality
pub trait Encoder: Send + Sync {
    /// Name recorded in item metadata, e.g. "clip"
    fn name(&self) -> &str;

    /// Modality this encoder accepts
    fn modality(&self) -> Modality;

    /// Embed `input`; the error string is surfaced as `EncoderFailure`
    fn embed(&self, input: &RawInput) -> Result<Vec<f32>, String>;
}

/// Encoder backed by a closure
pub struct FnEncoder<F> {
    name: String,
    modality: Modality,
    embed: F,
}

impl<F> FnEncoder<F>
where
    F: Fn(&RawInput) -> Result<Vec<f32>, String> + Send + Sync,
{
    /// Wrap `embed` as an encoder named `name` for `modality`
    pub fn new(name: impl Into<String>, modality: Modality, embed: F) -> Self {
        FnEncoder {
            name: name.into(),
            modality,
            embed,
        }
    }
}

impl<F> Encoder for FnEncoder<F>
where
    F: Fn(&RawInput) -> Result<Vec<f32>, String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    fn embed(&self, input: &RawInput) -> Result<Vec<f32>, String> {
        (self.embed)(input)
    }
}

/// Which modalities have an encoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderAvailability {
    /// Image encoder registered
    pub image: bool,
    /// Audio encoder registered
    pub audio: bool,
    /// Text encoder registered
    pub text: bool,
}

impl EncoderAvailability {
    /// Whether `modality` can be embedded
    pub fn supports(&self, modality: Modality) -> bool {
        match modality {
            Modality::Image => self.image,
            Modality::Audio => self.audio,
            Modality::Text => self.text,
            Modality::Unknown => false,
        }
    }
}

/// At most one encoder per modality
#[derive(Clone, Default)]
pub struct EncoderSet {
    encoders: BTreeMap<Modality, Arc<dyn Encoder>>,
}

impl EncoderSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an encoder for its modality
    pub fn register(&mut self, encoder: Arc<dyn Encoder>) -> XmodalResult<()> {
        let modality = encoder.modality();
        if !Modality::ENCODABLE.contains(&modality) {
            return Err(XmodalError::validation(format!(
                "encoder {} declares modality {}",
                encoder.name(),
                modality
            )));
        }
        if let Some(existing) = self.encoders.get(&modality) {
            return Err(XmodalError::AlreadyExists {
                name: format!("{} encoder ({})", modality, existing.name()),
            });
        }
        self.encoders.insert(modality, encoder);
        Ok(())
    }

    /// Builder form of `register`
    pub fn with(mut self, encoder: Arc<dyn Encoder>) -> XmodalResult<Self> {
        self.register(encoder)?;
        Ok(self)
    }

    /// Encoder for `modality`
    pub fn get(&self, modality: Modality) -> Option<&Arc<dyn Encoder>> {
        self.encoders.get(&modality)
    }

    /// Capability flags
    pub fn availability(&self) -> EncoderAvailability {
        EncoderAvailability {
            image: self.encoders.contains_key(&Modality::Image),
            audio: self.encoders.contains_key(&Modality::Audio),
            text: self.encoders.contains_key(&Modality::Text),
        }
    }

    /// Registered encoder names by modality
    pub fn names(&self) -> BTreeMap<Modality, String> {
        self.encoders
            .iter()
            .map(|(m, e)| (*m, e.name().to_string()))
            .collect()
    }

    /// Embed `input` with the encoder for `modality`
    pub fn embed(&self, modality: Modality, input: &RawInput) -> XmodalResult<Vec<f32>> {
        let encoder = self.get(modality).ok_or_else(|| {
            XmodalError::validation(format!("no encoder available for modality {modality}"))
        })?;
        encoder
            .embed(input)
            .map_err(|reason| XmodalError::EncoderFailure { modality, reason })
    }
}

impl fmt::Debug for EncoderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.names()).finish()
    }
}
