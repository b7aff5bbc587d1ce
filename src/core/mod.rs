pub mod landscape;
pub mod restoration_plan;
pub mod sum_tree;
pub mod decored;
pub mod dijkstra;
