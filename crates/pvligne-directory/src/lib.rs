//! Stand-in for the PV en Ligne user-search endpoint.
//!
//! Serves `GET /api/users/search/?q=` from a JSON users file, with the same
//! filtering and response shape as the web application.

pub mod routes;
