pub mod behavior;
pub mod clock;
pub mod event;
pub mod level;
pub mod player;
pub mod step;
pub mod world;
