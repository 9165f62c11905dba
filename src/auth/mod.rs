mod account;
mod token;

pub use account::{get_profile, post_log_in, post_log_out, register_user, update_profile};
pub use token::{AuthState, encode_token};
