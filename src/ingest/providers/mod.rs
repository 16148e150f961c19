// src/ingest/providers/mod.rs
pub mod hn;
pub mod jsearch;
pub mod remoteok;
pub mod wwr;

pub use hn::HnJobsProvider;
pub use jsearch::JSearchProvider;
pub use remoteok::RemoteOkProvider;
pub use wwr::WwrProvider;
