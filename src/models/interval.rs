//! Weekly availability interval model.

use serde::{Deserialize, Serialize};

/// A recurring weekly availability window, owned by one user.
///
/// Minutes are counted from local midnight. Beyond the type-level bounds,
/// no range or ordering policy is applied at write time; see DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTimeInterval {
    /// Document ID (UUID v4)
    pub id: String,
    /// Owning user's ID
    pub user_id: String,
    /// Day of week, 0 = Sunday
    pub week_day: u8,
    /// Window start, minutes since midnight
    pub start_minutes: u32,
    /// Window end, minutes since midnight
    pub end_minutes: u32,
    /// When the interval batch was written (RFC 3339)
    pub created_at: String,
}
