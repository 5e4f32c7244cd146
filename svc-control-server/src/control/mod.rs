pub mod commands;
pub mod history;
pub mod publisher;
pub mod reconciler;
pub mod sampler;

#[cfg(test)]
pub(crate) mod fakes;
