pub mod error;
pub mod extract;
pub mod history;
pub mod responder;
pub mod session;
pub mod summarize;
pub mod types;
pub mod util;
