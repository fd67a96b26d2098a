pub mod sessions;
pub mod shell;

pub use sessions::{OpenSession, SessionStore, SESSION_COOKIE};
pub use shell::{Banner, SessionView};
