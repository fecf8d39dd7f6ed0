pub mod seeds;

pub use seeds::{load_urls_from_file, parse_url_line};
