//! Terminal chat over CSV files: questions go to an LLM, the returned
//! snippet runs against the loaded dataframe, and the outcome comes back
//! as text, a table, or a chart.

pub mod assemble;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod exec;
pub mod handlers;
pub mod history;
pub mod llm;
pub mod render;
pub mod role;
