pub mod articles;
pub mod entities;
pub mod graph;
pub mod health;
