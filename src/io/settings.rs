// Copyright @yucwang 2026

use std::fmt;
use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::core::scene::{ DEFAULT_ENVIRONMENT_INTENSITY, DEFAULT_ENVIRONMENT_RADIUS };
use crate::math::constants::Float;

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(String),
    InvalidValue { name: String, value: String },
    UnknownSetting(String),
    MissingValue(String),
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "io error: {}", err),
            SettingsError::Parse(msg) => write!(f, "parse error: {}", msg),
            SettingsError::InvalidValue { name, value } => write!(f, "invalid value for {}: {}", name, value),
            SettingsError::UnknownSetting(name) => write!(f, "unknown setting: {}", name),
            SettingsError::MissingValue(name) => write!(f, "missing value for {}", name),
        }
    }
}

impl std::error::Error for SettingsError {}

pub const USAGE: &str = "\
Usage: tracer [--input scene.obj] [--output out.png] [--width N] [--height N]
              [--spp N] [--quality N] [--max-depth N] [--threads N]
              [--settings render.xml] [--progress] [--progress-interval SECONDS]";

#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub input: Option<String>,
    pub output: String,
    pub width: usize,
    pub height: usize,
    pub samples_per_pixel: usize,
    pub quality_level: u32,
    pub max_ray_depth: u32,
    /// 0 picks the hardware concurrency.
    pub thread_count: usize,
    pub report_progress: bool,
    pub progress_interval: u64,
    pub environment_intensity: Float,
    pub environment_radius: Float,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            input: None,
            output: String::from("out.png"),
            width: 256,
            height: 256,
            samples_per_pixel: 1,
            quality_level: 1,
            max_ray_depth: 2,
            thread_count: 0,
            report_progress: false,
            progress_interval: 0,
            environment_intensity: DEFAULT_ENVIRONMENT_INTENSITY,
            environment_radius: DEFAULT_ENVIRONMENT_RADIUS,
        }
    }
}

impl RenderSettings {
    /// Defaults, then the `--settings` file if given, then the other flags.
    /// `args` excludes the program name.
    pub fn from_args<I, S>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        let mut settings = RenderSettings::default();

        if let Some(i) = args.iter().position(|a| a == "--settings") {
            let path = args.get(i + 1).ok_or_else(|| SettingsError::MissingValue(String::from("--settings")))?;
            settings.load_xml_file(path)?;
        }

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--progress" => settings.report_progress = true,
                "--settings" => i += 1,
                _ if flag.starts_with("--") => {
                    let value = args.get(i + 1).ok_or_else(|| SettingsError::MissingValue(flag.to_string()))?;
                    settings.set(&flag[2..], value)?;
                    i += 1;
                }
                _ => return Err(SettingsError::UnknownSetting(flag.to_string())),
            }
            i += 1;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn load_xml_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SettingsError> {
        let xml = fs::read_to_string(path.as_ref())?;
        log::info!("Loading render settings from {}.", path.as_ref().display());
        self.load_xml_str(&xml)
    }

    /// Reads `<render>` with `<integer>`, `<float>`, `<string>` and
    /// `<boolean>` children, each carrying `name` and `value`.
    pub fn load_xml_str(&mut self, xml: &str) -> Result<(), SettingsError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Eof) => break,
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    match e.name().as_ref() {
                        b"render" => {}
                        b"integer" | b"float" | b"string" | b"boolean" => {
                            let mut name_attr: Option<String> = None;
                            let mut value_attr: Option<String> = None;
                            for attr in e.attributes().flatten() {
                                match attr.key.as_ref() {
                                    b"name" => name_attr = Some(attr.unescape_value().unwrap_or_default().to_string()),
                                    b"value" => value_attr = Some(attr.unescape_value().unwrap_or_default().to_string()),
                                    _ => {}
                                }
                            }
                            match (name_attr, value_attr) {
                                (Some(name), Some(value)) => self.set(&name, &value)?,
                                (Some(name), None) => return Err(SettingsError::MissingValue(name)),
                                _ => return Err(SettingsError::Parse(String::from("setting without a name"))),
                            }
                        }
                        other => {
                            let tag = String::from_utf8_lossy(other).to_string();
                            log::warn!("Ignoring unknown settings element <{}>.", tag);
                        }
                    }
                }
                Err(e) => {
                    return Err(SettingsError::Parse(e.to_string()));
                }
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Assigns one setting by name. Dashes and underscores are interchangeable.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SettingsError> {
        let key = name.replace('-', "_");
        match key.as_str() {
            "input" => self.input = Some(value.to_string()),
            "output" => self.output = value.to_string(),
            "width" => self.width = parse_number(name, value)?,
            "height" => self.height = parse_number(name, value)?,
            "spp" | "samples_per_pixel" => self.samples_per_pixel = parse_number(name, value)?,
            "quality" | "quality_level" => self.quality_level = parse_number(name, value)?,
            "max_depth" | "max_ray_depth" => self.max_ray_depth = parse_number(name, value)?,
            "threads" | "thread_count" => self.thread_count = parse_number(name, value)?,
            "progress" => self.report_progress = parse_number::<bool>(name, value)?,
            "progress_interval" => self.progress_interval = parse_number(name, value)?,
            "environment_intensity" => self.environment_intensity = parse_number(name, value)?,
            "environment_radius" => self.environment_radius = parse_number(name, value)?,
            _ => return Err(SettingsError::UnknownSetting(name.to_string())),
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [("width", self.width),
                        ("height", self.height),
                        ("spp", self.samples_per_pixel),
                        ("quality", self.quality_level as usize)];
        for (name, value) in positive.iter() {
            if *value == 0 {
                return Err(SettingsError::InvalidValue { name: name.to_string(), value: String::from("0") });
            }
        }
        if !(self.environment_radius > 0.0) {
            return Err(SettingsError::InvalidValue {
                name: String::from("environment_radius"),
                value: self.environment_radius.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse::<T>().map_err(|_| SettingsError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}
