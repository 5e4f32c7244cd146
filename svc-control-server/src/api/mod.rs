pub mod push;
pub mod serve;
pub mod service;
pub mod services;
pub mod system;
