pub mod controller;
pub mod session;
pub mod traits;
pub mod view;
pub mod voice;
