pub mod cli;
pub mod examples;
pub mod input;
pub mod render;
