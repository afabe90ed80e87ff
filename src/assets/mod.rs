//! # Asset loading
//!
//! One-shot asynchronous OBJ loading. [`AssetLoader::load`] parses the file on
//! a worker thread and hands back a [`LoadHandle`]; the result travels over a
//! `futures` oneshot channel. The handle can be awaited, polled without
//! blocking through [`LoadHandle::try_resolve`], or cancelled. Cancelling
//! drops the receiving end, so a late completion is discarded.

use std::future::Future;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use crate::error::{EffectError, Result};
use crate::gfx::geometry::{deindex, RawMesh};

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    }
}

/// Converts parsed OBJ models into a single triangle soup.
fn models_to_soup(models: &[tobj::Model], label: &str) -> Result<RawMesh> {
    let mut soup = RawMesh::default();
    for model in models {
        let mesh = &model.mesh;
        let positions: Vec<[f32; 3]> = mesh
            .positions
            .chunks_exact(3)
            .map(|p| [p[0], p[1], p[2]])
            .collect();
        soup.append(deindex(&positions, &mesh.indices)?);
        log::debug!(
            "Model '{}': {} indices de-indexed",
            model.name,
            mesh.indices.len()
        );
    }

    if soup.is_empty() {
        return Err(EffectError::EmptyAsset {
            path: label.to_string(),
        });
    }
    Ok(soup)
}

/// Loads an OBJ file on the calling thread.
///
/// Every model in the file is triangulated, de-indexed and concatenated.
/// Materials are ignored.
pub fn load_obj_blocking(path: impl AsRef<Path>) -> Result<RawMesh> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let (models, _materials) =
        tobj::load_obj(path, &load_options()).map_err(|source| EffectError::AssetLoad {
            path: label.clone(),
            source,
        })?;
    models_to_soup(&models, &label)
}

/// Parses OBJ text from a reader; `label` names the source in errors.
pub fn parse_obj(reader: &mut impl BufRead, label: &str) -> Result<RawMesh> {
    let (models, _materials) = tobj::load_obj_buf(reader, &load_options(), |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|source| EffectError::AssetLoad {
        path: label.to_string(),
        source,
    })?;
    models_to_soup(&models, label)
}

/// Creates a connected completer/handle pair.
pub fn load_channel(path: impl Into<PathBuf>) -> (LoadCompleter, LoadHandle) {
    let (sender, receiver) = oneshot::channel();
    (
        LoadCompleter { sender },
        LoadHandle {
            path: path.into(),
            receiver: Some(receiver),
        },
    )
}

/// Sending half of a load.
pub struct LoadCompleter {
    sender: oneshot::Sender<Result<RawMesh>>,
}

impl LoadCompleter {
    /// Resolves the load. Returns false if the handle was cancelled or
    /// dropped; the result is discarded in that case.
    pub fn complete(self, result: Result<RawMesh>) -> bool {
        self.sender.send(result).is_ok()
    }
}

/// Pending result of an asynchronous mesh load.
pub struct LoadHandle {
    path: PathBuf,
    receiver: Option<oneshot::Receiver<Result<RawMesh>>>,
}

impl LoadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_cancelled(&self) -> bool {
        self.receiver.is_none()
    }

    /// Non-blocking check. `None` while the load is still running.
    ///
    /// A handle yields its result once; afterwards it behaves as cancelled.
    pub fn try_resolve(&mut self) -> Option<Result<RawMesh>> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Some(Err(EffectError::LoadCancelled));
        };
        match receiver.try_recv() {
            Ok(Some(result)) => {
                self.receiver = None;
                Some(result)
            }
            Ok(None) => None,
            Err(oneshot::Canceled) => {
                // The worker went away without sending
                self.receiver = None;
                Some(Err(EffectError::LoadCancelled))
            }
        }
    }

    /// Stops waiting; a later completion is discarded.
    pub fn cancel(&mut self) {
        if self.receiver.take().is_some() {
            log::info!("Cancelled load of '{}'", self.path.display());
        }
    }
}

impl Future for LoadHandle {
    type Output = Result<RawMesh>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(receiver) = self.receiver.as_mut() else {
            return Poll::Ready(Err(EffectError::LoadCancelled));
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(outcome) => {
                self.receiver = None;
                Poll::Ready(outcome.unwrap_or(Err(EffectError::LoadCancelled)))
            }
        }
    }
}

/// Spawns OBJ loads on worker threads.
pub struct AssetLoader;

impl AssetLoader {
    pub fn load(path: impl Into<PathBuf>) -> LoadHandle {
        let path = path.into();
        let (completer, handle) = load_channel(path.clone());
        log::info!("Loading mesh '{}'", path.display());

        let spawned = std::thread::Builder::new()
            .name("fracture-asset-loader".to_string())
            .spawn(move || {
                let result = load_obj_blocking(&path);
                if let Err(e) = &result {
                    log::error!("{}", e);
                }
                if !completer.complete(result) {
                    log::debug!("Load of '{}' finished after cancellation", path.display());
                }
            });

        // A failed spawn drops the completer, which resolves the handle as cancelled
        if let Err(e) = spawned {
            log::error!("Failed to spawn asset loader thread: {}", e);
        }
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const QUAD_OBJ: &str = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    fn triangle_soup() -> RawMesh {
        RawMesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_parse_obj_triangulates_and_deindexes() {
        let mesh = parse_obj(&mut Cursor::new(QUAD_OBJ), "quad.obj").unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert!(mesh.positions().contains(&[1.0, 1.0, 0.0]));
    }

    #[test]
    fn test_parse_obj_without_faces_is_empty() {
        let result = parse_obj(&mut Cursor::new("v 0 0 0\n"), "points.obj");
        assert!(matches!(result, Err(EffectError::EmptyAsset { .. })));
    }

    #[test]
    fn test_missing_file_is_asset_error() {
        let result = load_obj_blocking("does/not/exist.obj");
        assert!(matches!(result, Err(EffectError::AssetLoad { .. })));
    }

    #[test]
    fn test_try_resolve_before_and_after_completion() {
        let (completer, mut handle) = load_channel("mesh.obj");
        assert!(handle.try_resolve().is_none());

        assert!(completer.complete(Ok(triangle_soup())));
        let mesh = handle.try_resolve().unwrap().unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert!(handle.is_cancelled());
    }

    #[test]
    fn test_cancel_discards_late_completion() {
        let (completer, mut handle) = load_channel("mesh.obj");
        handle.cancel();
        assert!(!completer.complete(Ok(triangle_soup())));
        assert!(matches!(
            handle.try_resolve(),
            Some(Err(EffectError::LoadCancelled))
        ));
    }

    #[test]
    fn test_dropped_completer_resolves_cancelled() {
        let (completer, handle) = load_channel("mesh.obj");
        drop(completer);
        let result = futures::executor::block_on(handle);
        assert!(matches!(result, Err(EffectError::LoadCancelled)));
    }

    #[test]
    fn test_awaiting_the_handle() {
        let (completer, handle) = load_channel("mesh.obj");
        let worker = std::thread::spawn(move || completer.complete(Ok(triangle_soup())));
        let mesh = futures::executor::block_on(handle).unwrap();
        assert!(worker.join().unwrap());
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_loader_rejects_missing_file() {
        let handle = AssetLoader::load("missing/model.obj");
        assert_eq!(handle.path(), Path::new("missing/model.obj"));
        let result = futures::executor::block_on(handle);
        assert!(matches!(result, Err(EffectError::AssetLoad { .. })));
    }
}
