pub mod config;
pub mod friends;
pub mod geo;
pub mod login;
pub mod shake;
pub mod source;
pub mod store;

pub use config::Config;
pub use geo::{Address, AddressResolver, StaticAddressResolver};
pub use source::{FeedEvent, FeedWatch, PostSource, RegionalFeed, SocialPostSource};
pub use store::{MemoryStore, RealtimeStore, StoreError, StoreEvent, Subscription};
