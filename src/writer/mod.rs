pub mod dataset;
pub mod model;

pub use dataset::DatasetWriter;
