mod store_error;

pub use store_error::*;

// store

mod token_store;
mod view_score_store;

pub use token_store::*;
pub use view_score_store::*;

// repo

mod item_repo;
mod user_repo;

pub use item_repo::*;
pub use user_repo::*;
