pub mod client;
pub mod comments;
pub mod error;
pub mod fetch;
pub mod item;
pub mod listing;
pub mod parse;
pub mod richtext;
pub mod urls;
pub mod visibility;

pub use client::{ClientConfig, ClientConfigBuilder, HackerNews};
pub use comments::{MAX_PARENT_HOPS, load_thread, parse_comments};
pub use error::{PalaverError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpFetcher;
pub use fetch::{Fetch, FetchConfig};
pub use item::{Comment, PostType, Story, Visibility, VoteLinks};
pub use listing::{parse_listing, parse_story};
pub use parse::Document;
pub use richtext::{Emphasis, Run, StyledText, render};
pub use urls::{BASE_URL, derive_unvote_url, item_url, listing_url};
pub use visibility::{child_count, displayable, root_of, toggle};
