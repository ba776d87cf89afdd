pub mod ai;
pub mod entity;
pub mod grid;
pub mod registry;
pub mod rules;
pub mod tile;
