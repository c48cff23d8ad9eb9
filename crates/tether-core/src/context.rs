//! Execution context handed to registered callbacks.

use crate::client::BoxedClient;

/// Context passed to every ready hook, periodic task, event handler, and
/// command handler.
///
/// Carries the connected client so callbacks can call back into the
/// platform. Cloning is cheap (one `Arc` bump per field).
#[derive(Clone)]
pub struct Context {
    client: BoxedClient,
}

impl Context {
    /// Creates a context around the connected client.
    pub fn new(client: BoxedClient) -> Self {
        Self { client }
    }

    /// Returns the connected client.
    pub fn client(&self) -> &BoxedClient {
        &self.client
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}
