//! Integration tests: full pipeline and HTTP API end to end.

mod fixtures;
mod http;
mod pipeline;
