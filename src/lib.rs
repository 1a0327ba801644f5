pub mod badges;
pub mod cell;
pub mod cli;
pub mod clock;
pub mod config;
pub mod persistence;
pub mod session;
pub mod simulation;
pub mod store;
