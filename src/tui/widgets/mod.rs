//! Reusable widgets

pub mod input;
pub mod toast;

pub use input::{Choice, FormFields, InputWidget, TextInput};
pub use toast::{toast_areas, Toast, ToastKind, ToastQueue, ToastWidget};
