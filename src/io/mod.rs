pub mod input;
pub mod markdown;
pub mod output;

pub use input::*;
pub use markdown::*;
pub use output::*;
