pub mod catalog;
pub mod export;
pub mod extraction;
pub mod geocode;
pub mod pipeline;
pub mod raster;
pub mod recognizer;
pub mod text;
pub mod vegetation;
pub mod verdict;

pub use catalog::StacClient;
pub use export::write_report;
pub use extraction::ClaimExtractor;
pub use geocode::NominatimClient;
pub use pipeline::{AuditPipeline, AuditReport, PipelineError};
pub use raster::RasterServiceClient;
pub use recognizer::NerClient;
pub use text::PlainTextSource;
pub use vegetation::VegetationService;
