pub mod access_jwt;
pub mod authorizer;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod principal;

pub use access_jwt::TokenVerifier;
pub use authorizer::{Authorizer, DenyReason};
pub use jwt::TokenIssuer;
pub use policy::AccessPolicy;
pub use principal::Principal;
