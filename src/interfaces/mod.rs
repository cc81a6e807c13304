pub mod command;
pub mod response;

pub use command::{Command, CommandError};
pub use response::ErrorResponse;
