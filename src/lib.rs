pub mod core;
pub mod backend;

pub use crate::core::{Amount, BudgetGroup, DateRange, Document, Purchase, Summary, ValidationError};
pub use crate::core::{amount, filter, normalize, summary};
pub use crate::backend::{JsonStore, Tracker, TrackerError};
