//! External catalog data: detections, pointing history, colors, footprint.
//!
//! Everything here is loaded once at startup and either handed to the
//! pipeline by value (the detection table) or held read-only in the
//! pipeline context (exposures, colors, footprint geometry).

pub mod colors;
pub mod detections;
pub mod footprint;
pub mod pointings;

pub use colors::ColorTable;
pub use detections::{load_detections, Detection};
pub use footprint::{Aabb, CameraFootprint, DetectorPolygon};
pub use pointings::{Exposure, ExposureCatalog};
