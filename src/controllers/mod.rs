pub mod health;
pub mod item;
pub mod playlist;

pub use item::ItemController;
pub use playlist::PlaylistController;
