pub mod catalog;
pub mod observations;
pub mod settings;
