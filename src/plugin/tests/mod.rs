//! Plugin manager test suites

mod utils;
