//! Integration tests for EduComic generation tracking and export

mod cli_routing;
mod export_pipeline;
pub mod test_utils;
