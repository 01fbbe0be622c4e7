pub mod notification;
pub mod session;
pub mod token;
pub mod user;

pub use notification::{MailPayload, ScheduledNotification};
pub use session::{EndSessionsMode, Session};
pub use token::AccessToken;
pub use user::{NotificationFrequency, PublicUser, User, UserRole};
