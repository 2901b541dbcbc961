//! CCM-Couchbase
//!
//! Client for the Couchbase cluster administration REST surface, driving
//! provisioning, topology and RBAC operations against one node's management
//! endpoint.

mod cluster;
pub use cluster::{Couchbase, CouchbaseAdmin, StorageMode};

pub mod errors;

mod credentials;
pub use credentials::Credentials;

mod node;
pub use node::{Node, ACTIVE_MEMBERSHIP};

mod service_options;
pub use service_options::ServiceOptions;

mod bucket;

mod user;
pub use user::AuthDomain;
