pub mod mortgage;
pub mod portfolio;
pub mod projection;
pub mod register;
pub mod simulation;
