pub mod autopilot;
pub mod commands;
