mod operation;
mod result_set;
mod row;

pub use operation::OperationResult;
pub use result_set::ResultSet;
pub use row::CustomDbRow;
