pub mod ask;
pub mod repl;
pub mod schema;
pub mod session;
