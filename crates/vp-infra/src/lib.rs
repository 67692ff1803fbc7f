pub mod config;
pub mod events;
pub mod http;
pub mod imaging;
pub mod session;
pub mod time;

pub use config::load_config;
pub use events::TracingWizardEventSink;
pub use http::{ApiClient, HttpOtpApi, HttpVisitorApi};
pub use imaging::ImageFrameEncoder;
pub use session::{LoggingSessionExpired, StaticAccessToken};
pub use time::SystemClock;
