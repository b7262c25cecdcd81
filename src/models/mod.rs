pub mod deliverable;
pub mod notification;
pub mod project;
pub mod ticket;
pub mod update;
pub mod user;

pub use deliverable::{Deliverable, DeliverableStatus, DeliverableSummary};
pub use notification::Notification;
pub use project::{Project, ProjectStatus, ProjectSummary};
pub use ticket::{Comment, Ticket, TicketCategory, TicketPriority, TicketStatus, TicketSummary};
pub use update::{Update, UpdateType};
pub use user::{ClientSummary, Role, User, UserSummary};
