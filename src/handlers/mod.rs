// Handler tiers
//
// Public (no auth) → Protected (JWT auth)
//
// Public endpoints (welcome document, health) live directly in main.rs;
// everything under /api/* requires a verified bearer token and a resolved
// user, both enforced by the middleware stack before any handler runs.

pub mod protected; // JWT authentication required (/api/*)
