//! Loader threads

use std::{
    fs::File,
    io::{ErrorKind, Read},
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use super::{decode_environment, decode_model, AssetKind, AssetSink, LoadedAsset};
use crate::error::AssetError;

const CHUNK_SIZE: usize = 256 * 1024;

/// Reads a whole file, reporting progress to `sink` after every chunk
pub fn read_with_progress<S: AssetSink + ?Sized>(
    path: &Path,
    kind: AssetKind,
    sink: &S,
) -> Result<Vec<u8>, AssetError> {
    let io_error = |source| AssetError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let total = file.metadata().map(|metadata| metadata.len()).unwrap_or(0);
    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let read = match file.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(io_error(e)),
        };
        bytes.extend_from_slice(&chunk[..read]);
        sink.progress(kind, bytes.len() as u64, total);
    }

    Ok(bytes)
}

/// Loads and decodes the `.hdr` environment map on a background thread
pub fn spawn_environment_load<S: AssetSink>(
    path: PathBuf,
    sink: S,
) -> std::io::Result<JoinHandle<()>> {
    spawn_load(AssetKind::Environment, path, sink, |path, sink| {
        let bytes = read_with_progress(path, AssetKind::Environment, sink)?;
        decode_environment(&bytes, path).map(LoadedAsset::Environment)
    })
}

/// Loads the glTF model and everything it references on a background thread
pub fn spawn_model_load<S: AssetSink>(path: PathBuf, sink: S) -> std::io::Result<JoinHandle<()>> {
    spawn_load(AssetKind::Model, path, sink, |path, sink| {
        let bytes = read_with_progress(path, AssetKind::Model, sink)?;
        decode_model(&bytes, path).map(LoadedAsset::Model)
    })
}

fn spawn_load<S, F>(
    kind: AssetKind,
    path: PathBuf,
    sink: S,
    load: F,
) -> std::io::Result<JoinHandle<()>>
where
    S: AssetSink,
    F: FnOnce(&Path, &S) -> Result<LoadedAsset, AssetError> + Send + 'static,
{
    thread::Builder::new()
        .name(format!("{kind}-loader"))
        .spawn(move || {
            log::info!("loading {kind} from '{}'", path.display());
            match load(&path, &sink) {
                Ok(asset) => sink.success(asset),
                Err(error) => sink.failure(kind, error),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::environment::tests::hdr_bytes;
    use crate::gfx::resources::TextureMapping;
    use futures::{channel::mpsc, executor::block_on, StreamExt};

    enum Report {
        Progress(AssetKind, u64, u64),
        Done(Result<LoadedAsset, (AssetKind, AssetError)>),
    }

    struct ChannelSink(mpsc::UnboundedSender<Report>);

    impl AssetSink for ChannelSink {
        fn progress(&self, kind: AssetKind, loaded: u64, total: u64) {
            let _ = self.0.unbounded_send(Report::Progress(kind, loaded, total));
        }

        fn success(&self, asset: LoadedAsset) {
            let _ = self.0.unbounded_send(Report::Done(Ok(asset)));
        }

        fn failure(&self, kind: AssetKind, error: AssetError) {
            let _ = self.0.unbounded_send(Report::Done(Err((kind, error))));
        }
    }

    /// Collects every report until the loader thread drops its sender
    fn collect(receiver: mpsc::UnboundedReceiver<Report>) -> Vec<Report> {
        block_on(receiver.collect::<Vec<_>>())
    }

    fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prism-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write temp file");
        path
    }

    #[test]
    fn progress_reaches_the_file_size() {
        let contents = vec![7u8; CHUNK_SIZE * 2 + 10];
        let path = temp_file("chunks.bin", &contents);
        let (sender, receiver) = mpsc::unbounded();

        let bytes = read_with_progress(&path, AssetKind::Model, &ChannelSink(sender))
            .expect("read");
        assert_eq!(bytes, contents);

        let progress: Vec<_> = collect(receiver)
            .into_iter()
            .filter_map(|report| match report {
                Report::Progress(_, loaded, total) => Some((loaded, total)),
                Report::Done(_) => None,
            })
            .collect();
        assert!(progress.len() >= 3);
        assert!(progress.windows(2).all(|pair| pair[0].0 < pair[1].0));
        let total = contents.len() as u64;
        assert_eq!(progress.last(), Some(&(total, total)));
    }

    #[test]
    fn environment_load_delivers_tagged_map() {
        let path = temp_file("env.hdr", &hdr_bytes(16, 8));
        let (sender, receiver) = mpsc::unbounded();

        spawn_environment_load(path, ChannelSink(sender))
            .expect("spawn")
            .join()
            .expect("loader thread panicked");

        let done = collect(receiver).into_iter().find_map(|report| match report {
            Report::Done(result) => Some(result),
            Report::Progress(..) => None,
        });
        match done {
            Some(Ok(LoadedAsset::Environment(map))) => {
                assert_eq!((map.width, map.height), (16, 8));
                assert_eq!(map.mapping, TextureMapping::EquirectangularReflection);
            }
            other => panic!("expected an environment, got {:?}", other.map(|r| r.map(|a| a.kind()))),
        }
    }

    #[test]
    fn missing_model_reports_io_failure() {
        let (sender, receiver) = mpsc::unbounded();
        spawn_model_load(PathBuf::from("does/not/exist.gltf"), ChannelSink(sender))
            .expect("spawn")
            .join()
            .expect("loader thread panicked");

        let reports = collect(receiver);
        assert_eq!(reports.len(), 1);
        match &reports[0] {
            Report::Done(Err((kind, AssetError::Io { path, .. }))) => {
                assert_eq!(*kind, AssetKind::Model);
                assert!(path.ends_with("exist.gltf"));
            }
            _ => panic!("expected an io failure"),
        }
    }
}
