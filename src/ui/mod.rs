mod main_view;
mod options_view;
mod platform_view;

pub use main_view::draw_main_view;
pub use options_view::draw_options_panel;
pub use platform_view::draw_platform_view;
