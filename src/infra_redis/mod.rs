mod token_store_redis;
mod view_score_store_redis;

pub use token_store_redis::*;
pub use view_score_store_redis::*;

mod util;
