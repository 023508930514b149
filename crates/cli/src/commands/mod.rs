pub mod config;
pub mod export;
pub mod ls;
pub mod matching;
pub mod network;
pub mod photos;
pub mod status;
