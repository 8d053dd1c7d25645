pub mod amount;
pub mod geometry;
pub mod operation;
pub mod settings;
pub mod transaction;

pub use amount::{Amount, AmountError};
pub use geometry::{BoundingBox, Token};
pub use operation::{Operation, OperationError, Report};
pub use settings::{ExtractionSettings, SettingsError};
pub use transaction::{Ledger, Transaction};
