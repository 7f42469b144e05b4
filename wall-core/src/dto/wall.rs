//! Wall DTOs

use serde::{Deserialize, Serialize};

/// Wall identity and object count, returned by create, count and put
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallSummary {
    pub wall_id: String,
    pub count: u64,
}
