pub mod generator;
pub mod registry;
pub mod resolved;
pub mod validator;

pub use generator::*;
pub use registry::*;
pub use resolved::*;
pub use validator::*;
