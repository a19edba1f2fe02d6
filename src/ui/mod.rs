pub mod layout;
mod menu;
mod quiz;

pub use layout::{calculate_menu_chunks, calculate_quiz_chunks};
pub use menu::draw_menu;
pub use quiz::draw_quiz;
