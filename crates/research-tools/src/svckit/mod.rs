//! Service Kit - Agent Tools
//!
//! Research tools that implement `agent_core::Tool`. Each takes a single
//! query string and returns plain text for the model to read.

mod text;

mod arxiv;
mod semantic_scholar;
mod wikipedia;
mod serper;
mod python_repl;

pub use arxiv::ArxivSearchTool;
pub use semantic_scholar::SemanticScholarTool;
pub use wikipedia::WikipediaSearchTool;
pub use serper::SerperSearchTool;
pub use python_repl::PythonReplTool;
