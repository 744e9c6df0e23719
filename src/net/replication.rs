//! State the authority replicates to every remote copy of a component.

use super::error::ProtocolError;
use crate::core::{ActionTypeKey, SegmentId};
use crate::timeline::NetSyncProps;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceReplication {
    pub type_key: ActionTypeKey,
    pub active: Option<SegmentId>,
    /// Playback of the instance's own timeline, when it has one bound.
    pub timeline: Option<NetSyncProps>,
}

/// Roster, active segments and timeline playback of one component.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentReplication {
    pub instances: Vec<InstanceReplication>,
    pub shared_timeline: Option<NetSyncProps>,
}

impl ComponentReplication {
    pub fn find(&self, key: &ActionTypeKey) -> Option<&InstanceReplication> {
        self.instances.iter().find(|instance| &instance.type_key == key)
    }

    pub fn contains(&self, key: &ActionTypeKey) -> bool {
        self.find(key).is_some()
    }

    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serialize(self).map_err(|source| ProtocolError::Encode {
            what: "component replication",
            source,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        bincode::deserialize(bytes).map_err(|source| ProtocolError::Decode {
            what: "component replication",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::PlaybackStatus;

    #[test]
    fn replication_state_survives_the_wire() {
        let state = ComponentReplication {
            instances: vec![InstanceReplication {
                type_key: ActionTypeKey::new("Attack"),
                active: Some(SegmentId(1)),
                timeline: Some(NetSyncProps {
                    status: PlaybackStatus::Playing,
                    position: 42.5,
                    loops: 2,
                }),
            }],
            shared_timeline: None,
        };

        let decoded = ComponentReplication::decode(&state.encode().unwrap()).unwrap();

        assert_eq!(decoded, state);
        assert!(decoded.contains(&ActionTypeKey::new("Attack")));
        assert!(!decoded.contains(&ActionTypeKey::new("Dodge")));
    }
}
