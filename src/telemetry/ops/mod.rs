pub mod activity;
pub mod serve;
