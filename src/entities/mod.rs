//! Persistent entities for the storefront.

pub mod address;
pub mod cart;
pub mod cart_item;
pub mod order;
pub mod saree;
pub mod user;

// Re-export entities
pub use address::{Entity as Address, Model as AddressModel};
pub use cart::{Entity as Cart, Model as CartModel};
pub use cart_item::{Entity as CartItem, Model as CartItemModel};
pub use order::{Entity as Order, Model as OrderModel, PaymentState};
pub use saree::{Entity as Saree, Model as SareeModel};
pub use user::{Entity as User, Model as UserModel};
