pub mod account_service;
pub mod admin_service;
pub mod notification_service;
pub mod partner_service;
pub mod session_service;
pub mod tracking_service;

pub use account_service::{AccountError, AccountService};
pub use admin_service::{AdminService, PortalStats};
pub use notification_service::NotificationService;
pub use partner_service::PartnerService;
pub use session_service::SessionService;
pub use tracking_service::TrackingService;
