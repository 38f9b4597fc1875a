//! Configuration options for building extraction records.

use serde::{Deserialize, Serialize};

/// What to do with Follow-up rows when the template has no Follow-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FollowUpFallback {
    /// Build an ad-hoc node with one Text entry per non-linkage column.
    #[default]
    Synthesize,
    /// Leave the rows out of the output.
    Skip,
}

/// Options controlling record construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    /// Render numeric `spd_id` values two digits wide in `spd_XX` keys.
    pub zero_pad_spd_id: bool,

    /// Attribution written to every generated node's `user` field.
    ///
    /// When unset, the Extraction prototype's own `user` is reused for all
    /// generated nodes.
    pub user: Option<String>,

    pub follow_up_fallback: FollowUpFallback,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_zero_pad_spd_id(mut self, enable: bool) -> Self {
        self.zero_pad_spd_id = enable;
        self
    }

    #[must_use]
    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    #[must_use]
    pub fn with_follow_up_fallback(mut self, fallback: FollowUpFallback) -> Self {
        self.follow_up_fallback = fallback;
        self
    }

    /// Instance key for an SPD node, e.g. `spd_3` or `spd_03`.
    ///
    /// Non-numeric ids are used as given.
    pub fn spd_key(&self, spd_id: &str) -> String {
        let trimmed = spd_id.trim();
        match trimmed.parse::<u64>() {
            Ok(number) if self.zero_pad_spd_id => format!("spd_{number:02}"),
            Ok(number) => format!("spd_{number}"),
            Err(_) => format!("spd_{trimmed}"),
        }
    }
}
