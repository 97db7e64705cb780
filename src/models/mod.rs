pub mod candidate;
pub mod meeting;
pub mod pending;

pub use candidate::*;
pub use meeting::*;
pub use pending::*;
