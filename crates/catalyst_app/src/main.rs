use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;

use catalyst_assets::Document;
use catalyst_core::App;
use catalyst_renderer::{RenderPasses, RenderPlugin};
use catalyst_scene::{SceneModelInstance, ScenePlugin, Scenes};
use clap::Parser;
use flecs_ecs::prelude::*;
use glam::{Mat4, Vec3};

const FRAME_DELTA: Duration = Duration::from_micros(16_667);

/// Loads a glTF scene and runs the frame loop headless.
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to the .gltf document.
    path: PathBuf,

    /// Number of frames to run.
    #[clap(long, default_value_t = 120)]
    frames: u32,

    /// Number of instances of the model to place.
    #[clap(long, default_value_t = 1)]
    instances: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(err) = run(args) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let Args {
        path,
        frames,
        instances,
    } = args;

    let json = fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    let files = read_external_files(&path, &json)?;
    let resources: Vec<(&str, &[u8])> = files
        .iter()
        .map(|(uri, bytes)| (uri.as_str(), bytes.as_slice()))
        .collect();

    let mut app = App::new();
    app.add_plugin(ScenePlugin);
    app.add_plugin(RenderPlugin::default());

    let model = app
        .world
        .get::<&mut Scenes>(|scenes| scenes.load(&path.to_string_lossy(), &json, &resources))?;
    log::info!(
        "{}: {} nodes, {} animations",
        model.name,
        model.graph.len(),
        model.animations.len()
    );

    // Place the copies side by side along X
    for i in 0..instances {
        let transform = Mat4::from_translation(Vec3::new(i as f32 * 2.0, 0.0, 0.0));
        let instance = SceneModelInstance::new(model.clone(), transform, &[])?;
        app.world.entity_named(&format!("instance_{i}")).set(instance);
    }

    for frame in 0..frames {
        app.update_with_delta(FRAME_DELTA);

        let failed = app.world.get::<&RenderPasses>(|passes| {
            if let Some(err) = &passes.failure {
                log::error!("frame {frame}: {err}");
                return true;
            }
            for pass in passes.passes() {
                log::debug!(
                    "frame {frame}: {} pass, {} renderables, {} shaders",
                    pass.name,
                    pass.renderables.len(),
                    pass.shaders.len()
                );
            }
            false
        });
        if failed || !app.running {
            break;
        }
    }

    app.world.get::<&RenderPasses>(|passes| {
        for pass in passes.passes() {
            log::info!(
                "{} pass: {} renderables, {} shader variants",
                pass.name,
                pass.renderables.len(),
                pass.shaders.len()
            );
        }
    });
    Ok(())
}

/// Reads every buffer and image the document references by relative uri.
fn read_external_files(path: &Path, json: &str) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
    let document = Document::from_json(json)?;
    let dir = path.parent().unwrap_or(Path::new("."));

    let uris = document
        .buffers
        .iter()
        .filter_map(|buffer| buffer.uri.as_deref())
        .chain(document.images.iter().filter_map(|image| image.uri.as_deref()))
        .filter(|uri| !uri.starts_with("data:"));

    let mut files = Vec::new();
    for uri in uris {
        let bytes = fs::read(dir.join(uri)).with_context(|| format!("reading {uri}"))?;
        log::debug!("read {uri} ({} bytes)", bytes.len());
        files.push((uri.to_string(), bytes));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_instances_default_when_omitted() {
        let args = Args::try_parse_from(["catalyst_app", "scene.gltf"]).unwrap();
        assert_eq!(args.path, PathBuf::from("scene.gltf"));
        assert_eq!(args.frames, 120);
        assert_eq!(args.instances, 1);

        let args =
            Args::try_parse_from(["catalyst_app", "scene.gltf", "--frames", "5", "--instances", "3"]).unwrap();
        assert_eq!((args.frames, args.instances), (5, 3));
        assert!(Args::try_parse_from(["catalyst_app", "scene.gltf", "--frames", "many"]).is_err());
    }
}
