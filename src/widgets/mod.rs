pub mod dialog;
pub mod list;
pub mod text_input;

pub use dialog::{Dialog, DialogButton, DialogSignal};
pub use list::{ListMode, ListOptions, ListSignal, ListView};
