//! Supabase-compatible HTTP/WebSocket binding.
//!
//! - rows: PostgREST under `/rest/v1`
//! - session: GoTrue under `/auth/v1`
//! - avatars: storage buckets under `/storage/v1`
//! - change notifications: Phoenix channels on `/realtime/v1/websocket`
//!
//! Every request carries the `apikey` header and a bearer token (the session
//! token when signed in, the anon key otherwise).

pub mod auth;
pub mod connection;
pub mod realtime;
pub mod rest;
pub mod storage;

pub use auth::HttpAuth;
pub use connection::HttpConnection;
pub use realtime::HttpChangeFeed;
pub use rest::HttpRepository;
pub use storage::HttpObjectStorage;
