pub mod chart;
pub mod config;
pub mod error;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod parse;
pub mod table;
pub mod web;
