mod identity;
mod item;
mod page;
mod social;
mod token;

pub use identity::*;
pub use item::*;
pub use page::*;
pub use social::*;
pub use token::*;
