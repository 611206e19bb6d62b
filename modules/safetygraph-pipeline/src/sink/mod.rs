pub mod json;
pub mod relational;

pub use json::{read_export, JsonExport};
pub use relational::RelationalSink;
