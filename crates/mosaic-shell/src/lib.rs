pub mod metrics;
pub mod request;
pub mod session;

pub use metrics::display_metrics;
pub use request::{Notice, Request, Response};
pub use session::Session;
