pub use cancel::CancelToken;
pub use clock::{Clock, SystemClock, Timestamp};
pub use http::{HttpClient, HttpResponse};
pub use time_sync::TimeSync;

mod cancel;
mod clock;
mod http;
mod time_sync;
