//! Client-side access control.
//!
//! The route guard decides whether a view may render for the current
//! session. It exists so the client does not offer actions the user cannot
//! perform; the remote API enforces the real permissions.

pub mod capabilities;
pub mod guard;
pub mod routes;

pub use capabilities::Capabilities;
pub use guard::{
    AuthorizationDenied, DASHBOARD_ROUTE, Decision, ENTRY_ROUTE, HOME_ROUTE, LOGIN_ROUTE,
    authorize,
};
pub use routes::{Access, Navigation, RouteMatch, RouteRule, RouteTable, shows_navbar};
