#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod filter;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use filter::{build_filter, FilterKey, FilterSet, Predicate};
pub use types::{AnswerResult, DocType, DocumentChunk, QueryRequest, ScoredChunk, GLOBAL_FUND_ID};
