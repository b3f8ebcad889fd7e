//! Page objects for the demo app screens.
//!
//! Each page declares its locators and exposes semantic operations composed
//! from the [`BasePage`](crate::page::BasePage) primitives. Pages hold no
//! element handles between calls.
//!
//! - [`drag`] - the drag-and-drop puzzle
//! - [`forms`] - text input and the toggle switch

pub mod drag;
pub mod forms;

pub use drag::DragPage;
pub use forms::FormsPage;
