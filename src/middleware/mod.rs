/*
 * Responsibility
 * - Middleware entry points (each exposes `apply`)
 */
pub mod auth;
pub mod http;
pub mod security_headers;
