pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, StatusLine};
pub use header::{draw_header, HeaderInfo};
pub use utils::{overlay_area, relative_age, truncate, type_color};
