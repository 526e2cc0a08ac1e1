pub mod bundle;
pub mod graph;
