pub mod input;
pub mod localization_json;
pub mod matrix;
pub mod output;

pub use input::{read_coordinate_records, CoordinateRecord};
pub use localization_json::load_localization;
pub use matrix::{load_matrix_pair, FixedMatrices, MatrixError, MatrixProvider, MriInfo, TransformKind};
pub use output::{leads_to_map, write_leads_json, LeadOutput};
