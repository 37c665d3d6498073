pub mod pipeline;
pub mod playlist;
pub mod script;
pub mod shared;
pub mod speech;
