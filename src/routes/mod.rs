//! Router Module Index
//!
//! The gate serves only a handful of routes itself; everything else falls through
//! to the page renderer. The route guard wraps all of them, so nothing here needs
//! its own authentication layer.

/// Routes that are always reachable (health check).
pub mod public;

/// Cookie session management (login / logout).
pub mod session;
