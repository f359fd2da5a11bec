mod f_oauth;

pub use f_oauth::{fetch_user, try_oauth, UserCache};
