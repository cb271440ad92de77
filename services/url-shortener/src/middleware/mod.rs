//! Request pipeline stages.
//!
//! Each route group is wrapped by an explicit, ordered list of stages built in
//! [`stack`]. Gates sit innermost, next to the handlers they protect.

pub mod basic_auth;
pub mod format;
pub mod gate;
pub mod recovery;
pub mod stack;
pub mod timeout;

pub use basic_auth::{operator_gate, OperatorCredentials, OPERATOR_AUTH_HEADER};
pub use format::{FormatLayer, FormatService, UrlFormat};
pub use gate::{authorization_gate, GateState};
pub use recovery::panic_response;
pub use stack::with_common_stages;
pub use timeout::{RequestTimeoutLayer, RequestTimeoutService};
