pub mod categories;
pub mod category;
pub mod error;
pub mod id;
pub mod import_export;
pub mod note;
pub mod search;
pub mod storage;
pub mod workspace;
pub mod xref;
