/// Router Module Index
///
/// Routes are grouped by the gate that protects them. The admin and alumni routers are
/// wrapped in their gate middleware by `create_router`, so a handler in those modules is
/// never reached without the matching session flag.

/// Routes open to anonymous visitors: landing page, job board, both login forms, logout.
pub mod public;

/// Routes behind the admin gate (`require_admin`).
pub mod admin;

/// Routes behind the alumni gate (`require_alumni`).
pub mod alumni;
