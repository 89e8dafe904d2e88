pub mod contact;
pub mod customer;
pub mod lifecycle;
pub mod money;
pub mod order;
pub mod product;
pub mod stock;
pub mod validation;
pub mod visit;
