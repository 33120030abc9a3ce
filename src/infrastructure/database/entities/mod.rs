//! Database entities module

pub mod item_extra;
pub mod item_takeout;
pub mod menu_item;
pub mod order;
pub mod order_item;
pub mod order_item_extra;
pub mod order_item_takeout;
pub mod pc;
pub mod session;
pub mod user;

pub use item_extra::Entity as ItemExtra;
pub use item_takeout::Entity as ItemTakeout;
pub use menu_item::Entity as MenuItem;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use order_item_extra::Entity as OrderItemExtra;
pub use order_item_takeout::Entity as OrderItemTakeout;
pub use pc::Entity as Pc;
pub use session::Entity as Session;
pub use user::Entity as User;
