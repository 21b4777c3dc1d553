//! 도메인 모델.

mod claims;
mod identity;
mod page;
mod role;

pub use claims::{Claims, TokenPair, TokenSubject};
pub use identity::{Identity, IdentityView, NewIdentity, RequestIdentity};
pub use page::{PageRequest, UserPage, DEFAULT_RECORDS_PER_PAGE};
pub use role::Role;
