//! API Module
//!
//! HTTP handlers and routing for the registry REST API.
//!
//! # Endpoints
//! - `GET /telefonos` - List phones page by page
//! - `GET /telefonos/:id` - Retrieve a phone by id
//! - `GET /telefonos/imei/:imei` - Retrieve a phone by IMEI (cached)
//! - `POST /telefonos` - Create a phone
//! - `PUT /telefonos/:id` - Replace a phone
//! - `DELETE /telefonos/:id` - Delete a phone
//! - `GET /stats` - Cache-aside statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;
pub mod validation;

pub use handlers::*;
pub use routes::create_router;
