use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Upper bound on `kernel.max_steps`; the walk never samples more candidates.
pub const MAX_KERNEL_STEPS: u32 = 16;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionKind {
    #[default]
    Sweep,
    Orbit,
    Still,
    Wander,
}

impl MotionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MotionKind::Sweep => "sweep",
            MotionKind::Orbit => "orbit",
            MotionKind::Still => "still",
            MotionKind::Wander => "wander",
        }
    }
}

impl std::str::FromStr for MotionKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sweep" | "pan" => Ok(MotionKind::Sweep),
            "orbit" | "circle" => Ok(MotionKind::Orbit),
            "still" | "static" | "none" => Ok(MotionKind::Still),
            "wander" | "random" => Ok(MotionKind::Wander),
            other => Err(format!(
                "invalid motion '{other}'; expected sweep, orbit, still or wander"
            )),
        }
    }
}

/// A scene file: which sources to show, kernel tunables, how the viewpoint
/// moves and where frames go.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SceneConfig {
    pub version: u32,
    #[serde(default)]
    pub scene: SceneSources,
    #[serde(default)]
    pub kernel: KernelSection,
    #[serde(default)]
    pub projection: ProjectionSection,
    #[serde(default)]
    pub motion: MotionSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SceneSources {
    pub image: Option<PathBuf>,
    pub depth: Option<PathBuf>,
    pub video: Option<PathBuf>,
    pub video_depth: Option<PathBuf>,
}

impl SceneSources {
    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.depth.is_none()
            && self.video.is_none()
            && self.video_depth.is_none()
    }

    /// Rebases relative paths onto `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.image,
            &mut self.depth,
            &mut self.video,
            &mut self.video_depth,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct KernelSection {
    pub compression: Option<f32>,
    pub steps: Option<u32>,
    pub max_steps: Option<u32>,
    pub confidence_max: Option<f32>,
    pub anti_alias: Option<bool>,
    pub aa_trigger: Option<f32>,
    pub correct: Option<bool>,
    pub correct_power: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectionSection {
    pub upscale: Option<f32>,
    pub perspective: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MotionSection {
    pub kind: Option<MotionKind>,
    pub sensitivity: Option<f32>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub frame_interval: Option<Duration>,
    /// Sweep: pointer x at the first and last frame.
    pub from: Option<f32>,
    pub to: Option<f32>,
    /// Sweep: constant vertical viewpoint.
    pub lift: Option<f32>,
    /// Orbit: time for one revolution.
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub period: Option<Duration>,
    pub radius: Option<f32>,
    pub seed: Option<u64>,
    /// Still: fixed viewpoint.
    pub viewpoint: Option<[f32; 2]>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct OutputSection {
    #[serde(default, deserialize_with = "deserialize_size_opt")]
    pub size: Option<(u32, u32)>,
    pub frames: Option<u32>,
    pub directory: Option<PathBuf>,
    pub still: Option<PathBuf>,
    pub threads: Option<usize>,
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    match helper {
        None => Ok(None),
        Some(Helper::Str(raw)) => parse_size(&raw).map(Some).map_err(de::Error::custom),
        Some(Helper::Pair([width, height])) => {
            if width == 0 || height == 0 {
                return Err(de::Error::custom("size dimensions must be non-zero"));
            }
            Ok(Some((width, height)))
        }
    }
}

/// Parses `WIDTHxHEIGHT` (also accepts `X` and `*` as separators).
pub fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    let normalized = raw.trim().to_ascii_lowercase().replace('*', "x");
    let (w, h) = normalized
        .split_once('x')
        .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = w
        .trim()
        .parse()
        .map_err(|err| format!("invalid width in '{raw}': {err}"))?;
    let height: u32 = h
        .trim()
        .parse()
        .map_err(|err| format!("invalid height in '{raw}': {err}"))?;
    if width == 0 || height == 0 {
        return Err(format!("size '{raw}' must be non-zero"));
    }
    Ok((width, height))
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    /// Parses a config file's contents and rebases its relative source
    /// paths onto the directory that holds it.
    pub fn from_toml_str_at(input: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_toml_str(input)?;
        if let Some(base) = path.parent() {
            config.scene.resolve_relative_to(base);
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        let kernel = &self.kernel;
        if let Some(compression) = kernel.compression {
            if !(compression > 0.0 && compression <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "kernel.compression must be in (0, 1], got {compression}"
                )));
            }
        }
        if let Some(steps) = kernel.steps {
            if steps < 2 {
                return Err(ConfigError::Invalid(format!(
                    "kernel.steps must be at least 2, got {steps}"
                )));
            }
        }
        if let Some(max_steps) = kernel.max_steps {
            if !(1..=MAX_KERNEL_STEPS).contains(&max_steps) {
                return Err(ConfigError::Invalid(format!(
                    "kernel.max_steps must be in 1..={MAX_KERNEL_STEPS}, got {max_steps}"
                )));
            }
        }
        for (name, value) in [
            ("kernel.confidence_max", kernel.confidence_max),
            ("kernel.correct_power", kernel.correct_power),
            ("projection.upscale", self.projection.upscale),
            ("motion.sensitivity", self.motion.sensitivity),
        ] {
            if let Some(value) = value {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ConfigError::Invalid(format!(
                        "{name} must be a positive number, got {value}"
                    )));
                }
            }
        }
        for (name, value) in [
            ("kernel.aa_trigger", kernel.aa_trigger),
            ("projection.perspective", self.projection.perspective),
            ("motion.from", self.motion.from),
            ("motion.to", self.motion.to),
            ("motion.lift", self.motion.lift),
            ("motion.radius", self.motion.radius),
        ] {
            if let Some(value) = value {
                if !value.is_finite() {
                    return Err(ConfigError::Invalid(format!(
                        "{name} must be finite, got {value}"
                    )));
                }
            }
        }
        if let Some([x, y]) = self.motion.viewpoint {
            if !(x.is_finite() && y.is_finite()) {
                return Err(ConfigError::Invalid("motion.viewpoint must be finite".into()));
            }
        }

        if self.motion.frame_interval.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid(
                "motion.frame_interval must be greater than zero".into(),
            ));
        }
        if self.motion.period.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::Invalid("motion.period must be greater than zero".into()));
        }

        if self.output.frames == Some(0) {
            return Err(ConfigError::Invalid("output.frames must be at least 1".into()));
        }
        if self.output.threads == Some(0) {
            return Err(ConfigError::Invalid("output.threads must be at least 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[scene]
image = "image.png"
depth = "imageDepth.png"

[kernel]
compression = 0.7
steps = 16
anti_alias = false

[projection]
upscale = 1.1
perspective = 0.02

[motion]
kind = "orbit"
sensitivity = 1.5
frame_interval = "40ms"
period = "6s"
radius = 0.5

[output]
size = "640x360"
frames = 24
directory = "frames"
"#;

    #[test]
    fn parses_sample_config() {
        let config = SceneConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.scene.image.as_deref(), Some(Path::new("image.png")));
        assert_eq!(config.kernel.compression, Some(0.7));
        assert_eq!(config.kernel.anti_alias, Some(false));
        assert_eq!(config.motion.kind, Some(MotionKind::Orbit));
        assert_eq!(config.motion.period, Some(Duration::from_secs(6)));
        assert_eq!(config.motion.frame_interval, Some(Duration::from_millis(40)));
        assert_eq!(config.output.size, Some((640, 360)));
        assert_eq!(config.output.frames, Some(24));
    }

    #[test]
    fn sections_are_optional() {
        let config = SceneConfig::from_toml_str("version = 1").expect("minimal config");
        assert!(config.scene.is_empty());
        assert_eq!(config.motion.kind, None);
        assert_eq!(config.motion.frame_interval, None);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = SceneConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_out_of_range_kernel_values() {
        let err = SceneConfig::from_toml_str(
            r#"
version = 1
[kernel]
compression = 1.5
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("compression")));

        let err = SceneConfig::from_toml_str(
            r#"
version = 1
[kernel]
steps = 1
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn caps_kernel_iterations() {
        let err = SceneConfig::from_toml_str("version = 1\n[kernel]\nmax_steps = 17\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("max_steps")));

        let config = SceneConfig::from_toml_str("version = 1\n[kernel]\nmax_steps = 16\n")
            .expect("budget at the cap");
        assert_eq!(config.kernel.max_steps, Some(MAX_KERNEL_STEPS));
    }

    #[test]
    fn unrepresentable_durations_are_parse_errors() {
        for raw in ["inf", "1e300"] {
            let input = format!("version = 1\n[motion]\nframe_interval = {raw}\n");
            let err = SceneConfig::from_toml_str(&input).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{raw}: {err}");
        }
    }

    #[test]
    fn rejects_zero_sized_output() {
        let err = SceneConfig::from_toml_str(
            r#"
version = 1
[output]
size = "0x100"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn accepts_size_pairs_and_numeric_durations() {
        let config = SceneConfig::from_toml_str(
            r#"
version = 1
[motion]
frame_interval = 0.5
period = 4
[output]
size = [320, 200]
"#,
        )
        .expect("parse");
        assert_eq!(config.output.size, Some((320, 200)));
        assert_eq!(config.motion.frame_interval, Some(Duration::from_millis(500)));
        assert_eq!(config.motion.period, Some(Duration::from_secs(4)));
    }

    #[test]
    fn rejects_unknown_motion_kind() {
        let err = SceneConfig::from_toml_str(
            r#"
version = 1
[motion]
kind = "spin"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn relative_sources_follow_config_location() {
        let config = SceneConfig::from_toml_str_at(SAMPLE, Path::new("/scenes/lake/scene.toml"))
            .expect("parse");
        assert_eq!(
            config.scene.depth.as_deref(),
            Some(Path::new("/scenes/lake/imageDepth.png"))
        );
    }

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_size(" 800 X 600 "), Ok((800, 600)));
        assert_eq!(parse_size("64*48"), Ok((64, 48)));
        assert!(parse_size("1920").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn motion_kind_from_str_is_lenient() {
        assert_eq!("Orbit".parse::<MotionKind>(), Ok(MotionKind::Orbit));
        assert_eq!("static".parse::<MotionKind>(), Ok(MotionKind::Still));
        assert!("spin".parse::<MotionKind>().is_err());
    }
}
