//! Raw field values and the reusable row that carries them between pipeline stages.

mod error;
mod row;
mod value;

pub use error::RowError;
pub use row::GenericRow;
pub use value::Value;
