// server/src/models/mod.rs

//! Data structures representing database entities and their read views.

pub mod cart_item;
pub mod delivery_address;
pub mod order;
pub mod order_item;
pub mod product;
pub mod user;

pub use cart_item::{CartItem, CartLine, CheckoutLine};
pub use delivery_address::{DeliveryAddress, DeliveryInfo, NewDeliveryAddress};
pub use order::{Order, OrderStatus, OrderView};
pub use order_item::{OrderItem, OrderItemView};
pub use product::Product;
pub use user::User;
