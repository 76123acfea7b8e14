pub mod agent;
pub mod daemon;
pub mod onboard;
pub mod status;

mod runtime;
pub(crate) use runtime::Runtime;
