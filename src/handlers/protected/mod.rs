// Protected handlers (JWT authentication required)
//
// Route prefix: /api/*
// Middleware stack: jwt_auth_middleware (bearer token verification) →
// resolve_user_middleware (subject lookup). Handlers receive the resolved
// identity as a CurrentUser extension and never see unauthenticated traffic.

pub mod files; // File CRUD operations
