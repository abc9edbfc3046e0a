//! Widget persona resolution and embed script generation.

mod persona;
pub mod repository;
mod script;

pub use persona::{PersonaResolver, WidgetBranding};
pub use repository::WidgetSettingsRepository;
pub use script::render_widget_script;
