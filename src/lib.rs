pub mod accounts;
pub mod assessment;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod logging;
pub mod output;
pub mod quiz;
pub mod storage;
pub mod transcribe;
pub mod wizard;
