// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "docs/docs_service.rs"]
pub mod docs;
