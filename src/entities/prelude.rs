//! Re-exports of all entity types for convenient importing

pub use super::currencies::Entity as Currencies;
pub use super::product_prices::Entity as ProductPrices;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
