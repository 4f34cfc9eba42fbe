pub mod config;
pub mod directory;
pub mod domain;
pub mod errors;

pub use directory::UserDirectory;
pub use domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
pub use errors::{ApplicationError, DomainError, InterfaceError};
