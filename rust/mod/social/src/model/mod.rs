mod actor;
mod comment;
mod notification;
mod post;
mod user;

pub use actor::*;
pub use comment::*;
pub use notification::*;
pub use post::*;
pub use user::*;
