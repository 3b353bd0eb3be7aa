pub mod partner;
pub mod report;
pub mod session;
pub mod tracking;
pub mod user;

pub use partner::StudyPartner;
pub use report::{ReportStatus, UserReport};
pub use session::SharedSession;
pub use tracking::{Assignment, Exam};
pub use user::{AuthSession, Profile, User};
