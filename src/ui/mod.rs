pub mod filters;
pub mod results;
pub mod rows;
pub mod timeline;
pub mod widgets;

pub use filters::render_filters_view;
pub use results::render_results_view;
pub use timeline::render_timeline_view;
