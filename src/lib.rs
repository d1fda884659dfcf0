//! In-process HTTP stubbing for test suites.
//!
//! Test code declares the outgoing requests it expects and the responses (or
//! failures) to hand back instead of touching the network. An interception
//! [`Hook`] routes requests into a [`StubRegistry`], which answers with the
//! first matching [`Stub`].
//!
//! # Features
//!
//! - **Request Matching**: Match by method, exact URL or URL matcher, headers, body
//! - **Matchers**: Exact strings, regexes, raw bytes, structural JSON equality
//! - **Failure Simulation**: Resolve to a transport failure instead of a reply
//! - **Delivery Callbacks**: Get notified whenever a response is handed out
//! - **Declarative Stubs**: Load stubs from YAML documents
//!
//! # Example
//!
//! ```
//! use netstub::{Method, Request, Stub, StubRegistry, StubResponse};
//!
//! let registry = StubRegistry::new();
//! registry.add(
//!     Stub::builder(Method::Get)
//!         .url("http://example.com/hello")
//!         .header("Accept", "text/plain")
//!         .response(StubResponse::ok().with_body("Hello, World!"))
//!         .build(),
//! );
//!
//! let request = Request::new(Method::Get, "http://example.com/hello")
//!     .with_header("Accept", "text/plain");
//! let response = registry.resolve(&request).unwrap();
//! assert_eq!(response.body(), Some(&b"Hello, World!"[..]));
//!
//! registry.stop();
//! assert!(registry.resolve(&request).is_err());
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod matcher;
pub mod registry;
pub mod request;
pub mod response;
pub mod stub;

pub use config::{Settings, StubsConfig};
pub use error::{Result, StubError};
pub use matcher::Matcher;
pub use registry::{Hook, Lifecycle, RegistryStats, StubRegistry};
pub use request::{HttpRequest, Method, Request};
pub use response::{Failure, FailureKind, StubResponse};
pub use stub::{Stub, StubBuilder, UrlCriterion};
