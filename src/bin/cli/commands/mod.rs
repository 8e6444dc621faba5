pub mod ask;
pub mod ingest;
pub mod list;
pub mod retrieve;
