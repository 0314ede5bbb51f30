mod ingredients;
mod recipes;
mod relations;
mod shopping_cart;
mod tags;
mod users;

pub use ingredients::*;
pub use recipes::*;
pub use relations::*;
pub use shopping_cart::*;
pub use tags::*;
pub use users::*;
