//! Backend adapters over reqwest.

mod client;
mod dto;
mod otp;
mod visitor;

pub use client::ApiClient;
pub use otp::HttpOtpApi;
pub use visitor::HttpVisitorApi;
