pub mod faculty;
pub mod identity;

pub use faculty::*;
pub use identity::*;
