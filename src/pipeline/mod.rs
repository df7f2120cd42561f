//! In-memory view building over store snapshots: search, pagination,
//! owner enrichment, summary statistics and CSV export. Nothing here touches
//! a store.

pub mod enrich;
pub mod export;
pub mod query;
pub mod stats;
