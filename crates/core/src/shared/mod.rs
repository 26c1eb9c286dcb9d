pub mod cancel_token;
pub mod constants;
pub mod frame;
