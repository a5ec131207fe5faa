pub mod answer;
pub mod command;
pub mod config;
pub mod consts;
pub mod dispatch;
pub mod error;
pub mod numeric;
pub mod oracle;
pub mod server;
