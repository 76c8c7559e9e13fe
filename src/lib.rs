pub mod coach;
pub mod config;
pub mod pose;
pub mod record;
pub mod replay;
