pub mod comments;
pub mod deliverables;
pub mod notifications;
pub mod projects;
pub mod tickets;
pub mod updates;
pub mod users;
