pub mod accepted;
pub mod issue;
pub mod transcript;

pub use accepted::*;
pub use issue::*;
pub use transcript::*;
