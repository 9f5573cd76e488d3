pub mod layout;
mod table;

pub use table::*;
