pub mod error;
pub mod languages;
pub mod value;
pub mod verdict;

pub use error::{JudgeError, JudgeResult};
pub use languages::{Language, RuntimeConfig};
pub use value::Value;
pub use verdict::Verdict;
