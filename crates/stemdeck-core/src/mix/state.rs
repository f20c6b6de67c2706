//! Persistable mix state

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::ChannelId;

/// Gain and mute of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelMix {
    pub gain: f32,
    #[serde(default)]
    pub muted: bool,
}

/// Lock flag plus the last known gain/mute of every channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixState {
    pub locked: bool,
    pub channels: BTreeMap<ChannelId, ChannelMix>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_state_yaml_shape() {
        let yaml = "locked: true\nchannels:\n  vocals:\n    gain: 0.5\n  drums:\n    gain: 0.25\n    muted: true\n";
        let state: MixState = serde_yaml::from_str(yaml).unwrap();
        assert!(state.locked);
        assert_eq!(state.channels[&ChannelId::new("vocals")], ChannelMix { gain: 0.5, muted: false });
        assert!(state.channels[&ChannelId::new("drums")].muted);
    }
}
