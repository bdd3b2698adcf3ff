pub mod config;
pub mod generator;
pub mod llm;
pub mod models;
pub mod packaging;
pub mod web;
