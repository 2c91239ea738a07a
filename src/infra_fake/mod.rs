//! In-process backends selected with `backend = "fake"`. They honour the
//! same atomicity contracts as the real adapters and double as test stores.

mod item_repo_fake;
mod token_store_fake;
mod user_repo_fake;
mod view_score_store_fake;

pub use item_repo_fake::*;
pub use token_store_fake::*;
pub use user_repo_fake::*;
pub use view_score_store_fake::*;
