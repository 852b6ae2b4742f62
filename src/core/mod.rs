pub mod amount;
pub mod error;
pub mod normalize;
pub mod record;
pub mod document;
pub mod filter;
pub mod summary;

pub use amount::Amount;
pub use error::{RecordError, ValidationError};
pub use record::{BudgetGroup, NewBudgetGroup, NewPurchase, Purchase, RecordId};
pub use document::{Collection, Decoded, Document, SkippedRecord};
pub use filter::DateRange;
pub use summary::Summary;
