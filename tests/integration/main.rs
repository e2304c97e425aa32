//! Integration tests driving the walkers against wiremock servers

mod common;
mod crawl_tests;
mod mirror_tests;
