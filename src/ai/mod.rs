pub mod strategy;
pub mod turn;

pub use strategy::{GreedyStrategy, TurnStrategy};
pub use turn::{ComputerTurn, TurnStep};
