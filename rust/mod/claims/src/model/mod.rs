mod claim;
mod item;
mod merchant;
mod token;
mod user;

pub use claim::*;
pub use item::*;
pub use merchant::*;
pub use token::*;
pub use user::*;
