use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use moonwake_assets::{Asset, AssetLoader, AssetStore, LoadRequest};
use moonwake_render::{RenderView, Renderer, SceneTextRenderer};
use moonwake_scene::{SceneConfig, build_scene};

#[derive(Parser)]
#[command(name = "moonwake-cli", about = "Headless tooling for the moonwake scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and configuration summary
    Info,
    /// Import every asset the configured scene references and report what
    /// loaded
    ProbeAssets,
    /// Build the configured scene and print its text rendering
    PrintScene,
}

fn load_config(path: &Option<PathBuf>) -> anyhow::Result<SceneConfig> {
    Ok(match path {
        Some(path) => SceneConfig::from_yaml(path)?,
        None => SceneConfig::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Info => {
            println!("moonwake-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets dir: {}", config.assets_dir.display());
            println!(
                "controls: {:?}  water: {}  lamp: {}  audio: {}  fog: {}",
                config.controls, config.water, config.lamp, config.audio, config.fog
            );
            let scene = build_scene(&config);
            println!(
                "scene: {} nodes, {} renderables, {} lights",
                scene.graph.len(),
                scene.renderables.len(),
                scene.lights.len()
            );
        }
        Commands::ProbeAssets => {
            let scene = build_scene(&config);
            let mut loader = AssetLoader::new();
            let mut store = AssetStore::new();

            for renderable in scene.renderables.values() {
                if let moonwake_scene::MeshSource::Model { path } = &renderable.mesh {
                    loader.request(LoadRequest::Model {
                        key: path.clone(),
                        path: config.resolve(path),
                    });
                }
                if let Some(texture) = &renderable.material.texture {
                    loader.request(LoadRequest::Texture {
                        key: texture.clone(),
                        path: config.resolve(texture),
                    });
                }
            }
            if let Some(water) = &scene.water {
                loader.request(LoadRequest::Texture {
                    key: water.normal_map.clone(),
                    path: config.resolve(&water.normal_map),
                });
            }
            if let Some(sky) = &scene.sky {
                loader.request(LoadRequest::Cubemap {
                    key: sky.faces[0].clone(),
                    paths: sky.faces.clone().map(|face| config.resolve(&face)),
                });
            }

            let requested = loader.pending();
            loader.wait_all(&mut store);

            println!("requested {requested}, loaded {}:", store.len());
            for path in store.paths() {
                let detail = match store.by_path(path) {
                    Some(Asset::Model(meshes)) => {
                        let vertices: usize = meshes.iter().map(|m| m.positions.len()).sum();
                        format!("model, {} meshes, {} vertices", meshes.len(), vertices)
                    }
                    Some(Asset::Texture(t)) => format!("texture {}x{}", t.width, t.height),
                    Some(Asset::Cubemap(c)) => format!("cubemap {0}x{0} x6", c.size),
                    None => "unresolved".to_string(),
                };
                println!("  {path}: {detail}");
            }
        }
        Commands::PrintScene => {
            let scene = build_scene(&config);
            let output = SceneTextRenderer::new().render(&scene, &RenderView::default());
            print!("{output}");
        }
    }

    Ok(())
}
