pub mod record;
pub mod session;

pub use record::{AttendanceRecord, AttendanceStatus, RawRecord};
pub use session::StudentSession;
