//! Query core: partition tools, routing, filtered retrieval and prompted
//! synthesis, plus the ingestion pipeline that feeds the index.

pub mod ingest;
pub mod orchestrator;
pub mod prompts;
pub mod registry;
pub mod retriever;
pub mod router;
pub mod synthesizer;
pub mod tools;

pub use orchestrator::{QueryError, QueryOrchestrator};
pub use retriever::PartitionedRetriever;
pub use router::{KeywordSelector, LlmSelector, Router, RouterState, Selector};
pub use synthesizer::AnswerSynthesizer;
pub use tools::{build_tools, Partition, Tool, ToolDescription};
