// The infra module contains implementations of core ports.
// Each implementation goes in its own submodule.

#[path = "google/docs_api_client.rs"]
pub mod google;
