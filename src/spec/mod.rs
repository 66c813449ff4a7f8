mod build;
mod load;
mod schema;
mod types;

pub use build::*;
pub use load::*;
pub use schema::*;
pub use types::*;
