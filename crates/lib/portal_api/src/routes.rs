//! Route paths.

pub const GET_API_HEALTH: &str = "/api/health";

pub const POST_PORTAL_REQUEST_LINK: &str = "/api/portal/request-link";
pub const POST_PORTAL_VERIFY: &str = "/api/portal/verify";
pub const POST_PORTAL_SESSION: &str = "/api/portal/session";
pub const POST_PORTAL_LOGOUT: &str = "/api/portal/logout";
pub const GET_PORTAL_ORDERS: &str = "/api/portal/orders";
pub const GET_PORTAL_ORDERS_ID: &str = "/api/portal/orders/{id}";

pub const GET_ARTICLES_SLUG: &str = "/api/articles/{slug}";

pub const POST_INTERNAL_ORDERS: &str = "/api/internal/orders";
pub const POST_INTERNAL_ORDERS_ID_STATUS: &str = "/api/internal/orders/{id}/status";

pub const GET_MONITORING: &str = "/api/monitoring";
pub const POST_MONITORING_PROBE: &str = "/api/monitoring/probe";
