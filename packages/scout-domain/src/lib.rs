pub mod event;
pub mod extractor;
pub mod location;
pub mod normalize;
pub mod params;
pub mod progress;
pub mod prompt;
pub mod time_serde;

pub use event::{Event, Listing};
pub use params::{ANONYMOUS_USER, SearchParams, TimeFilter};
