pub mod archetype;
pub mod collision;
pub mod entity;
pub mod grid;
pub mod registry;
pub mod tile;
