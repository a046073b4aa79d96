pub mod config;
pub mod flow;
pub mod lineage;
