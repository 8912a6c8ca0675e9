pub(crate) mod actors;
pub(crate) mod acts;
pub(crate) mod bootstrap;
pub(crate) mod config;
pub(crate) mod factory;
pub(crate) mod hud;
pub(crate) mod level;
pub(crate) mod loop_runner;
pub(crate) mod pause;
pub(crate) mod segment;
