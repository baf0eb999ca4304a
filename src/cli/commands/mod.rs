pub mod config;
pub mod configs;
pub mod flags;
pub mod probes;
pub mod run;
pub mod sdk;
