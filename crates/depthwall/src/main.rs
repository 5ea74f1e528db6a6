mod bindings;
mod cli;
mod paths;
mod run;

use anyhow::Result;
use cli::Command;
use paths::AppPaths;
use scenepack::SceneRepository;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Paths) => run_paths(),
        None => run::run(cli.run),
    }
}

fn run_paths() -> Result<()> {
    let paths = AppPaths::discover()?;
    println!("Directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!("  data:       {}", paths.data_dir().display());
    println!("  share:      {}", paths.share_dir().display());
    println!("  defaults:   {}", paths.defaults_dir().display());
    println!("  scene file: {}", paths.config_file().display());
    println!("  frames:     {}", paths.frames_dir().display());
    println!("Scene search roots:");
    let roots = paths.scene_roots();
    for root in &roots {
        println!("  {}", root.display());
    }

    let scenes = SceneRepository::new(roots).list();
    if scenes.is_empty() {
        println!("No scene packs installed.");
    } else {
        println!("Installed scenes:");
        for name in scenes {
            println!("  scene://{name}");
        }
    }
    Ok(())
}
