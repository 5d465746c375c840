use serde::{Deserialize, Serialize};

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NetworkMode {
    OFFLINE,
    ONLINE_ALLOWLISTED,
}

impl NetworkMode {
    pub fn from_offline_flag(offline: bool) -> Self {
        if offline {
            NetworkMode::OFFLINE
        } else {
            NetworkMode::ONLINE_ALLOWLISTED
        }
    }
}
