// TabVault engine components
// Managers implement the reconciliation pipeline: identity resolution,
// tab history merging, live-event reconciliation, record resurrection,
// and the serialization queue feeding all of them.

pub mod dispatcher;
pub mod identity_resolver;
pub mod reconciler;
pub mod resurrection;
pub mod tab_merger;
