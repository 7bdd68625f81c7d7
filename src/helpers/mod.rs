pub mod handler_404;
pub mod session;
