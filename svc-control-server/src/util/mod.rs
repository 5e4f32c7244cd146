pub mod app_state;
pub mod health_query;
pub mod logging;
pub mod time;
