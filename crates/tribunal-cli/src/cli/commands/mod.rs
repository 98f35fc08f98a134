pub mod dispatch;
pub(crate) mod exemplars;
pub(crate) mod run;
pub(crate) mod runner_builder;
pub(crate) mod summary;
pub(crate) mod validate;

pub use dispatch::dispatch;
