use serde::{Deserialize, Serialize};

use super::Comic;

/// Payload of the remote catalog document
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Catalog {
    #[serde(default)]
    pub comics: Vec<Comic>,
}
