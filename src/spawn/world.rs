//! The object factory collaborator and the transforms it is handed.

use crate::core::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rigid transform: translation plus a yaw around the up axis (Z).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    pub yaw_degrees: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0, 0.0, 0.0],
        yaw_degrees: 0.0,
    };

    pub fn new(translation: [f32; 3], yaw_degrees: f32) -> Self {
        Self {
            translation,
            yaw_degrees,
        }
    }

    /// Express `local`, given relative to `self`, in the space `self` lives in.
    pub fn compose(&self, local: &Transform) -> Transform {
        let (sin, cos) = self.yaw_degrees.to_radians().sin_cos();
        let [x, y, z] = local.translation;
        Transform {
            translation: [
                self.translation[0] + x * cos - y * sin,
                self.translation[1] + x * sin + y * cos,
                self.translation[2] + z,
            ],
            yaw_degrees: self.yaw_degrees + local.yaw_degrees,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Template of an object a spawn track creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnTemplate {
    /// Identity of the template; reference-mode spawns are keyed by it.
    pub id: String,
    /// Placement relative to the instance's action-space origin.
    pub relative: Transform,
    /// Replicated objects are created and destroyed by the authority only.
    pub replicated: bool,
}

impl SpawnTemplate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            relative: Transform::IDENTITY,
            replicated: false,
        }
    }

    pub fn at(mut self, relative: Transform) -> Self {
        self.relative = relative;
        self
    }

    pub fn replicated(mut self) -> Self {
        self.replicated = true;
        self
    }
}

/// Failure reported by a [`SpawnWorld`] when it cannot create an object.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SpawnError {
    #[error("Unknown spawn template '{0}'")]
    UnknownTemplate(String),

    #[error("Spawning '{template}' was rejected: {reason}")]
    Rejected { template: String, reason: String },
}

/// World that owns the objects spawn tracks ask for.
///
/// The registry only keeps bookkeeping; the world decides what an object is.
pub trait SpawnWorld {
    fn spawn(&mut self, template: &SpawnTemplate, transform: Transform) -> Result<ObjectId, SpawnError>;

    fn destroy(&mut self, object: ObjectId);

    /// Destroy `object` once `delay_secs` have elapsed.
    fn destroy_after(&mut self, object: ObjectId, delay_secs: f32);

    fn is_alive(&self, object: ObjectId) -> bool;
}
