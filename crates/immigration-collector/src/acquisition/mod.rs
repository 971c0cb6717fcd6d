//! Acquisition: HTTP transport, discovery readers and page content extraction.

pub mod discovery;
pub mod feed_parser;
pub mod http_client;
pub mod page_extractor;
pub mod sitemap;
pub(crate) mod xml_source;
