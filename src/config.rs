use std::path::PathBuf;
use gfx_maths::Vec3;
use thiserror::Error;

pub const DEFAULT_TITLE: &str = "Walking City";
pub const DEFAULT_FOV: f32 = 45.0;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("expected a value after {0}")]
    MissingValue(String),
    #[error("invalid value {value:?} for {flag}")]
    InvalidValue { flag: String, value: String },
}

#[derive(Clone, Debug)]
pub struct DemoConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub model_scale: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: Vec3,
    pub headless: bool,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            vertex_shader: PathBuf::from("shaders/vertex.glsl"),
            fragment_shader: PathBuf::from("shaders/frag.glsl"),
            width: 800,
            height: 600,
            title: DEFAULT_TITLE.to_string(),
            model_scale: 0.5,
            fov: DEFAULT_FOV,
            near: 0.1,
            far: 100.0,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            headless: false,
        }
    }
}

impl DemoConfig {
    /// Parses command line arguments (without the program name). Unknown flags are ignored.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I) -> Result<DemoConfig, ConfigError> {
        let mut config = DemoConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--vertex" => config.vertex_shader = PathBuf::from(next_value(&mut args, &arg)?),
                "--fragment" => config.fragment_shader = PathBuf::from(next_value(&mut args, &arg)?),
                "--width" => config.width = parse_dimension(&arg, next_value(&mut args, &arg)?)?,
                "--height" => config.height = parse_dimension(&arg, next_value(&mut args, &arg)?)?,
                "--title" => config.title = next_value(&mut args, &arg)?,
                "--headless" => config.headless = true,
                _ => {}
            }
        }

        Ok(config)
    }
}

fn next_value<I: Iterator<Item = String>>(args: &mut I, flag: &str) -> Result<String, ConfigError> {
    args.next().ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_dimension(flag: &str, value: String) -> Result<u32, ConfigError> {
    match value.parse::<u32>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(ConfigError::InvalidValue { flag: flag.to_string(), value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_match_the_demo() {
        let config = DemoConfig::from_args(Vec::new()).unwrap();
        assert_eq!(config.width, 800);
        assert_eq!(config.height, 600);
        assert_eq!(config.title, "Walking City");
        assert_eq!(config.vertex_shader, PathBuf::from("shaders/vertex.glsl"));
        assert!(!config.headless);
    }

    #[test]
    fn flags_override_defaults() {
        let config = DemoConfig::from_args(args(&["--headless", "--vertex", "a.vs", "--fragment", "b.fs", "--width", "1024", "--bogus"])).unwrap();
        assert!(config.headless);
        assert_eq!(config.vertex_shader, PathBuf::from("a.vs"));
        assert_eq!(config.fragment_shader, PathBuf::from("b.fs"));
        assert_eq!(config.width, 1024);
    }

    #[test]
    fn missing_value_is_an_error() {
        assert_eq!(DemoConfig::from_args(args(&["--vertex"])).unwrap_err(), ConfigError::MissingValue("--vertex".to_string()));
    }

    #[test]
    fn bad_dimension_is_an_error() {
        assert!(matches!(DemoConfig::from_args(args(&["--height", "tall"])), Err(ConfigError::InvalidValue { .. })));
        assert!(matches!(DemoConfig::from_args(args(&["--width", "0"])), Err(ConfigError::InvalidValue { .. })));
    }
}
