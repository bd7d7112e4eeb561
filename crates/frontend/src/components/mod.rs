pub mod key_selector;
pub mod legend_panel;
pub mod map_frame;
pub mod mode_selector;
