//! Domain entities: addresses, chains, users and API tokens.

pub mod address;
pub mod api_token;
pub mod chain;
pub mod email;
pub mod filter;
pub mod generators;
pub mod hash;
pub mod id;
pub mod user;

pub use address::{Address, AddressKind, AddressMetadata};
pub use api_token::ApiToken;
pub use chain::{Chain, ChainAddressSummary, ChainSummary};
pub use email::Email;
pub use filter::{
    AddressFilter, ApiTokenFilter, ChainFilter, Filter, PaginationMetadata, QueryMap, UserFilter,
    DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};
pub use generators::{gen_alias, gen_reply_alias, mask_email};
pub use hash::Hash;
pub use id::Id;
pub use user::{Role, User};
