pub mod document;
pub mod extraction;
pub mod inventory;
pub mod line_item;
