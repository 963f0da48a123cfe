pub mod district;
pub mod ingest;
pub mod trends;
