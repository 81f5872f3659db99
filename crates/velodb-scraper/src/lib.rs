pub mod client;
pub mod crawl;
pub mod discover;
pub mod error;
pub mod extract;
pub mod parse;
pub mod pipeline;

pub use client::PageClient;
pub use crawl::crawl_site;
pub use discover::discover;
pub use error::ScraperError;
pub use extract::extract_product_id;
pub use parse::{parse_product_page, PageSelectors, ParsedProduct};
pub use pipeline::{run_pipeline, PipelineError, RunSummary};
