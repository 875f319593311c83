mod linalg;
mod rbf;

pub use linalg::*;
pub use rbf::*;
