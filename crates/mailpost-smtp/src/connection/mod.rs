//! Connection management and the submission session.

mod session;
mod stream;

pub use session::{SendReport, Session, State, Step};
pub use stream::{BoxedStream, Connector, MailStream, TcpConnector};
