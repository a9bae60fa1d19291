//! xmodal - cross-modal similarity search over a shared embedding space
//!
//! Images, audio clips and text snippets are embedded by external encoders
//! into one vector space, stored in a flat inner-product index, and
//! queried with an input of any modality.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use xmodal::{AddRequest, EncoderSet, IndexService, Pipeline, RawInput, XmodalConfig};
//!
//! let config = XmodalConfig::load_or_init("data".as_ref())?;
//! let service = Arc::new(IndexService::open_default("data".as_ref(), config.index_options())?);
//! let encoders = EncoderSet::new().with(my_image_encoder)?.with(my_text_encoder)?;
//! let pipeline = Pipeline::new(service, encoders, config.pipeline_options());
//!
//! pipeline.add(AddRequest::file("photos/cat.png"))?;
//! let hits = pipeline.search(&RawInput::Text("a sleeping cat".into()), 5)?;
//! ```
//!
//! # Architecture
//!
//! - `xmodal-core`: error taxonomy, modality, metadata and result types
//! - `xmodal-durability`: on-disk formats and atomic persistence
//! - `xmodal-engine`: vector store, catalog, index service, registry, pipeline

pub use xmodal_core::*;
pub use xmodal_durability::{CollectionPaths, LoadedCollection, PersistenceManager, SaveOutcome};
pub use xmodal_engine::*;
