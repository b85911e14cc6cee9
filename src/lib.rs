pub mod error;
pub mod format;
pub mod grid;
pub mod interp;
pub mod loader;
pub mod model;
pub mod points;
pub mod reconcile;
pub mod sampler;
pub mod table;
pub mod track;
pub mod writer;

pub use error::{DemError, Result};
pub use format::DemFormat;
pub use grid::{GridField, GridFrame};
pub use interp::Interpolation;
pub use model::{ElevationUnit, LonDomain, QueryPoint};
pub use sampler::{read_dem, Method, SampleOptions};
pub use table::ElevationTable;
pub use track::TrackSampler;
pub use writer::TableWriter;
