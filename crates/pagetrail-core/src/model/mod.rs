//! Page data model: collections, page state, action kinds, audit entries.

pub mod action;
pub mod audit;
pub mod collection;
pub mod page;

pub use action::{ActionCategory, ActionKind, Subject, Verb};
pub use audit::{prepare_field_entry, AuditLogEntry, NewAuditEntry};
pub use collection::{
    CollectionKind, CollectionShape, Reference, ID_KEY, POSITION_KEY, VALUE_KEY,
};
pub use page::{PageState, Section};
