mod project;
mod user;

pub use project::Project;
pub use user::User;
