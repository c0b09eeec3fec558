pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod media;
pub mod normalize;
pub mod preview;
pub mod render;
pub mod report;
pub mod transport;
pub mod util;
