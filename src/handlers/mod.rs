pub mod auth;
pub mod middleware;
pub mod price;
pub mod product;
