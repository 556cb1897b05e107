//! Routing envelopes to viewer services.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::task::JoinError;
use tracing::{debug, info, warn};

use atlas_pipeline::{AcquireError, AcquisitionPipeline};

use crate::camera::CameraRig;
use crate::command::{placement_of, Command};
use crate::envelope::{CommandEnvelope, ResponseEnvelope};
use crate::error::{ProtocolError, ProtocolResult};
use crate::lighting::LightingRig;

/// Everything a command can act on.
#[derive(Clone)]
pub struct Services {
    pub pipeline: Arc<AcquisitionPipeline>,
    pub camera: Arc<dyn CameraRig>,
    pub lighting: Arc<dyn LightingRig>,
}

/// Decodes namespaced envelopes and executes them.
#[derive(Clone)]
pub struct Dispatcher {
    namespace: String,
    prefix: String,
    response_type: String,
    services: Services,
}

impl Dispatcher {
    pub fn new(namespace: impl Into<String>, services: Services) -> Self {
        let namespace = namespace.into();
        Self {
            prefix: format!("{namespace}_"),
            response_type: ResponseEnvelope::response_type(&namespace),
            namespace,
            services,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Whether an envelope of this type would be handled.
    pub fn accepts(&self, kind: &str) -> bool {
        kind.starts_with(&self.prefix) && kind != self.response_type
    }

    /// Handle an envelope given as a JSON value (object or JSON text).
    ///
    /// Returns `None` for anything that is not a namespaced command,
    /// including undecodable input.
    pub async fn dispatch_value(&self, value: Value) -> Option<ResponseEnvelope> {
        match CommandEnvelope::from_value(value) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable envelope");
                None
            }
        }
    }

    pub async fn dispatch_json(&self, text: &str) -> Option<ResponseEnvelope> {
        match CommandEnvelope::from_json(text) {
            Ok(envelope) => self.dispatch(envelope).await,
            Err(e) => {
                warn!(error = %e, "ignoring undecodable envelope");
                None
            }
        }
    }

    /// Execute one envelope. Every failure becomes a `success: false`
    /// response tagged with the request id.
    pub async fn dispatch(&self, envelope: CommandEnvelope) -> Option<ResponseEnvelope> {
        if !self.accepts(&envelope.kind) {
            debug!(kind = %envelope.kind, "ignoring envelope outside namespace");
            return None;
        }
        let action = &envelope.kind[self.prefix.len()..];
        let outcome = match Command::parse(action, envelope.payload) {
            Ok(command) => self.execute(command).await,
            Err(ProtocolError::UnknownCommand(_)) => {
                Err(ProtocolError::UnknownCommand(envelope.kind.clone()))
            }
            Err(e) => Err(e),
        };

        Some(match outcome {
            Ok(data) => ResponseEnvelope::ok(&self.namespace, envelope.id, data),
            Err(e) => {
                info!(kind = %envelope.kind, error = %e, "command failed");
                ResponseEnvelope::failed(&self.namespace, envelope.id, e.to_string())
            }
        })
    }

    pub async fn execute(&self, command: Command) -> ProtocolResult<Value> {
        let pipeline = &self.services.pipeline;
        debug!(action = command.action(), "executing command");
        match command {
            // Loads run on their own task so a caller that goes away does not
            // strand the queue item mid-fetch.
            Command::LoadModel(m) => {
                let job = pipeline.spawn_acquire(
                    m.cdn_url,
                    m.model_id,
                    placement_of(m.position, m.scale),
                );
                let summary = job.await.map_err(join_failure)??;
                Ok(serde_json::to_value(summary)?)
            }
            Command::LoadArchive(a) => {
                let job =
                    pipeline.spawn_acquire_batch(a.archive_url, placement_of(a.position, a.scale));
                let report = job.await.map_err(join_failure)??;
                Ok(serde_json::to_value(report)?)
            }
            Command::SetModelVisibility(v) => {
                if pipeline.registry().set_visible(v.model_id.as_str(), v.visible)? {
                    Ok(Value::Null)
                } else {
                    Err(ProtocolError::NotFound(v.model_id.into_string()))
                }
            }
            Command::RemoveModel(r) => {
                if pipeline.registry().remove(r.model_id.as_str())? {
                    Ok(Value::Null)
                } else {
                    Err(ProtocolError::NotFound(r.model_id.into_string()))
                }
            }
            Command::GetModels => Ok(serde_json::to_value(pipeline.registry().list_all()?)?),
            Command::GetLoadingStatus => Ok(serde_json::to_value(pipeline.queue().snapshot()?)?),
            Command::SetView(v) => {
                if self.services.camera.set_view(&v.view_name, v.duration).await {
                    Ok(Value::Null)
                } else {
                    Err(ProtocolError::UnknownView(v.view_name))
                }
            }
            Command::SetCustomView(v) => {
                self.services
                    .camera
                    .set_custom_view(v.position, v.target, v.duration)
                    .await;
                Ok(Value::Null)
            }
            Command::GetCameraState => {
                Ok(serde_json::to_value(self.services.camera.camera_state().await)?)
            }
            Command::UpdateMaterial(patch) => {
                let touched = pipeline.registry().update_material_properties(&patch)?;
                Ok(json!({ "materials": touched }))
            }
            Command::SetAmbientIntensity(i) => {
                self.services.lighting.set_ambient_intensity(i.intensity).await;
                Ok(Value::Null)
            }
            Command::SetDirectionalIntensity(i) => {
                self.services
                    .lighting
                    .set_directional_intensity(i.intensity)
                    .await;
                Ok(Value::Null)
            }
        }
    }
}

fn join_failure(e: JoinError) -> AcquireError {
    AcquireError::Internal(e.to_string())
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
