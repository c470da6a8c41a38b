pub mod http_client;
pub mod url;

pub use http_client::{FetchedResource, HttpResourceFetcher, ResourceFetcher, mime_essence};
pub use url::{PageOrigin, UrlUtils};
