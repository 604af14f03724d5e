pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn activity() -> LogCtx<ops::activity::Activity> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn serve() -> LogCtx<ops::serve::Serve> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
