mod jwt_codec;
mod social_login_service_impl;
mod token_service_impl;
mod view_service_impl;

pub use jwt_codec::*;
pub use social_login_service_impl::*;
pub use token_service_impl::*;
pub use view_service_impl::*;
