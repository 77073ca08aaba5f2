//! Export records to sheets and fill uploaded sheets from records
//!
//! Columns are described by a [`SheetMapping`]: a caption plus a `__`
//! separated [`FieldPath`] per column. Paths are resolved per record; a path
//! that fails degrades its cell to an error placeholder instead of failing
//! the export.

mod value;
mod record;
mod path;
mod mapping;
mod sheet;
mod query;
mod dump;
mod fill;
mod download;
pub mod formats;

pub use value::*;
pub use record::*;
pub use path::*;
pub use mapping::*;
pub use sheet::*;
pub use query::*;
pub use dump::*;
pub use fill::*;
pub use download::*;
