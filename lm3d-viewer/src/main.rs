//! Interactive viewer for glTF scenes over procedural terrain.

use std::path::PathBuf;

use config::ViewerConfig;

mod app;
mod config;
mod detail;
mod fps;
mod input;
mod logging;
mod screenshot;
mod shaders;
mod skybox;
mod terrain;
mod viewer;

/// Returns the value of `--config <path>`, if given.
fn config_arg(args: impl IntoIterator<Item = String>) -> Result<Option<PathBuf>, String> {
    let mut args = args.into_iter();
    match args.next().as_deref() {
        None => Ok(None),
        Some("--config") => args
            .next()
            .map(|path| Some(PathBuf::from(path)))
            .ok_or_else(|| "--config needs a path".to_owned()),
        Some(arg) => Err(format!("unknown argument '{arg}'")),
    }
}

fn run() -> Result<(), String> {
    let path = config_arg(std::env::args().skip(1))?;
    let config = ViewerConfig::load(path.as_deref())?;
    logging::init(config.log_level()).map_err(|e| e.to_string())?;

    let mut app = app::App::new(&config.window)?;
    let mut viewer = viewer::Viewer::new(&app, config).map_err(|e| e.to_string())?;
    viewer.run(&mut app).map_err(|e| e.to_string())
}

fn main() {
    if let Err(err) = run() {
        if log::log_enabled!(log::Level::Error) {
            log::error!("{err}");
        } else {
            eprintln!("{err}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_flag_takes_a_path() {
        assert_eq!(config_arg(args(&[])).unwrap(), None);
        assert_eq!(
            config_arg(args(&["--config", "viewer.json"])).unwrap(),
            Some(PathBuf::from("viewer.json"))
        );
        assert!(config_arg(args(&["--config"])).is_err());
        assert!(config_arg(args(&["--fullscreen"])).is_err());
    }
}
