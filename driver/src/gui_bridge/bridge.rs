use crate::gui_bridge::model::{ChromatogramModel, MaskPayload, MaskRequest};
use crate::workflow::runner::{Runner, WorkflowResult};
use anyhow::{anyhow, Context, Result};
use gcxgccore::{Mask, MaskIntegralSet, Sample, StageError};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::json;
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

pub fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Default)]
struct BridgeState {
    sample: Option<Sample>,
    model: ChromatogramModel,
}

/// HTTP bridge between the processing core and an external mask editor.
///
/// `GET /chromatogram` returns the current sample, `GET /masks` the loaded
/// masks, `POST /integrate` integrates submitted masks against the current
/// sample and `POST /masks` stores submitted masks as TIFF files.
#[derive(Clone)]
pub struct GuiBridge {
    state: Arc<RwLock<BridgeState>>,
    runner: Arc<Runner>,
    mask_dir: Option<PathBuf>,
    mask_prefix: String,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>, mask_dir: Option<PathBuf>, mask_prefix: Option<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(BridgeState::default())),
            runner,
            mask_dir,
            mask_prefix: mask_prefix.unwrap_or_default(),
        }
    }

    /// Starts serving on a background thread with its own runtime.
    pub fn serve(&self, address: SocketAddr) {
        let bridge = self.clone();
        let bridge_filter = warp::any().map(move || bridge.clone());

        let chromatogram_route = warp::path("chromatogram")
            .and(warp::path::end())
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|bridge: GuiBridge| respond(bridge.model()));

        let masks_route = warp::path("masks")
            .and(warp::path::end())
            .and(warp::get())
            .and(bridge_filter.clone())
            .map(|bridge: GuiBridge| respond(Ok(bridge.mask_payloads())));

        let integrate_route = warp::path("integrate")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter.clone())
            .map(|request: MaskRequest, bridge: GuiBridge| respond(bridge.integrate(&request)));

        let save_route = warp::path("masks")
            .and(warp::path::end())
            .and(warp::post())
            .and(warp::body::json())
            .and(bridge_filter)
            .map(|request: MaskRequest, bridge: GuiBridge| respond(bridge.save_masks(&request)));

        thread::spawn(move || {
            let routes = chromatogram_route
                .or(masks_route)
                .or(integrate_route)
                .or(save_route);
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                warp::serve(routes).run(address).await;
            });
        });
        info!("[GUI] bridge listening on http://{}", address);
    }

    pub fn publish(&self, result: &WorkflowResult) -> Result<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("bridge state poisoned"))?;
        guard.model = ChromatogramModel::from_result(result);
        guard.sample = Some(result.sample.clone());
        info!(
            "[GUI] {} published, {} x {} matrix",
            guard.model.name,
            guard.model.rt2_seconds.len(),
            guard.model.rt1_minutes.len()
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    pub fn model(&self) -> Result<ChromatogramModel> {
        let guard = self
            .state
            .read()
            .map_err(|_| anyhow!("bridge state poisoned"))?;
        Ok(guard.model.clone())
    }

    pub fn mask_payloads(&self) -> Vec<MaskPayload> {
        self.runner.masks().iter().map(MaskPayload::from_mask).collect()
    }

    /// Integrates the submitted masks against the published sample.
    pub fn integrate(&self, request: &MaskRequest) -> Result<MaskIntegralSet> {
        let masks = to_masks(request)?;
        let mut guard = self
            .state
            .write()
            .map_err(|_| anyhow!("bridge state poisoned"))?;
        let sample = guard
            .sample
            .as_ref()
            .context("no sample has been published yet")?;
        let integrals = self
            .runner
            .integrator()
            .integrate_sample(sample, &masks)
            .context("integrating submitted masks")?;
        guard.model.integrals = Some(integrals.clone());
        Ok(integrals)
    }

    /// Writes each submitted mask to `<mask_dir>/<prefix><name>.tif`.
    pub fn save_masks(&self, request: &MaskRequest) -> Result<Vec<PathBuf>> {
        let dir = self
            .mask_dir
            .as_ref()
            .context("no mask directory configured")?;
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        let masks = to_masks(request)?;
        let file_names = masks
            .iter()
            .map(|mask| mask_file_name(&self.mask_prefix, mask.name()))
            .collect::<Result<Vec<_>>>()?;
        masks
            .iter()
            .zip(file_names)
            .map(|(mask, file_name)| {
                let path = dir.join(file_name);
                mask.save_tiff(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                Ok(path)
            })
            .collect()
    }
}

/// File name for a submitted mask; the name must stay a single path component.
fn mask_file_name(prefix: &str, name: &str) -> Result<String> {
    let stem = format!("{}{}", prefix, name);
    let escapes = name.is_empty()
        || name == "."
        || name.contains("..")
        || stem.contains(['/', '\\'])
        || Path::new(&stem).components().count() != 1;
    if escapes {
        return Err(StageError::Configuration(format!(
            "mask name {:?} is not a plain file name",
            name
        ))
        .into());
    }
    Ok(format!("{}.tif", stem))
}

fn to_masks(request: &MaskRequest) -> Result<Vec<Mask>> {
    request
        .masks
        .iter()
        .map(|payload| {
            payload
                .to_mask()
                .with_context(|| format!("reading mask {}", payload.name))
        })
        .collect()
}

fn respond<T: Serialize>(result: Result<T>) -> warp::reply::WithStatus<warp::reply::Json> {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK),
        Err(err) => {
            warn!("[GUI] request failed: {:#}", err);
            warp::reply::with_status(
                warp::reply::json(&json!({"status": "error", "message": format!("{:#}", err)})),
                StatusCode::BAD_REQUEST,
            )
        }
    }
}
