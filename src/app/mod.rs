//! Application module: command line front end of the bundle host

pub mod cli;
pub mod startup;
