//! The legacy import pipeline, leaves first: reading the legacy store,
//! discovering its fields, mapping them onto destination fields, resolving
//! assets, and orchestrating one record at a time.

pub mod assets;
pub mod destination;
pub mod importer;
pub mod legacy;
pub mod mapper;
pub mod probe;
