pub mod assign;
pub mod events;
pub mod identity;
pub mod ingest;
pub mod search;
pub mod stats;
pub mod status;
