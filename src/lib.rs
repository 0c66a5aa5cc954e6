pub mod binning;
pub mod config;
pub mod constants;
pub mod euvm_errors;
pub mod geometry;
pub mod observations;
pub mod pipeline;
pub mod regrid;
pub mod render;
pub mod sav;
pub mod stability;
pub mod table;
pub mod time;

pub use binning::{BinnedAggregate, BinningParams};
pub use config::EuvmConfig;
pub use euvm_errors::EuvmError;
pub use observations::Observation;
pub use pipeline::Pipeline;
pub use table::CombinedTable;
