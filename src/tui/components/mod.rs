// Components module - reusable UI building blocks
//
// The shell is the same on every frame:
// - Tab bar: one tab per source, unread dots
// - Search bar: only while searching
// - Log view: the focused source's rows plus scrollbar
// - Status bar: connection, counts, latest problem
//
// Help and toast are overlays drawn last.

pub mod help;
pub mod log_view;
pub mod scrollbar;
pub mod search_bar;
pub mod status_bar;
pub mod tab_bar;
pub mod toast;

pub use toast::Toast;
