//! HTTP API handlers for rugdesk-photos

pub mod dimensions;
pub mod health;
pub mod objects;
pub mod photos;

pub use dimensions::dimension_routes;
pub use health::health_routes;
pub use objects::object_routes;
pub use photos::photo_routes;
