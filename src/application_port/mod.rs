mod social_login_service;
mod token_service;
mod view_service;

pub use social_login_service::*;
pub use token_service::*;
pub use view_service::*;
