// Copyright 2020 TwoCookingMice

use tracer::core::scene::SimpleScene;
use tracer::io::image_writer::{ write_image, ImageWriteError };
use tracer::io::obj_utils::{ load_meshes_from_file, ObjLoadError };
use tracer::io::settings::{ RenderSettings, SettingsError, USAGE };
use tracer::math::bitmap::Bitmap;
use tracer::math::constants::Vector3f;
use tracer::renderers::renderer::Renderer;
use tracer::renderers::thread_bundle::RenderError;
use tracer::shapes::cube::cuboid;
use tracer::shapes::rectangle::rectangle;

use indicatif::{ ProgressBar, ProgressStyle };

use std::env;
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{ Duration, Instant };

#[derive(Debug)]
enum AppError {
    Settings(SettingsError),
    Obj(ObjLoadError),
    Render(RenderError),
    Write(ImageWriteError),
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        AppError::Settings(err)
    }
}

impl From<ObjLoadError> for AppError {
    fn from(err: ObjLoadError) -> Self {
        AppError::Obj(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Render(err)
    }
}

impl From<ImageWriteError> for AppError {
    fn from(err: ImageWriteError) -> Self {
        AppError::Write(err)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Settings(err) => write!(f, "settings: {}", err),
            AppError::Obj(err) => write!(f, "obj: {}", err),
            AppError::Render(err) => write!(f, "render: {}", err),
            AppError::Write(err) => write!(f, "output: {}", err),
        }
    }
}

fn main() {
    if env::var_os("RUST_LOG").is_none() {
        env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return;
    }

    if let Err(err) = run(&args) {
        log::error!("{}", err);
        if let AppError::Settings(_) = err {
            eprintln!("{}", USAGE);
        }
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), AppError> {
    let settings = RenderSettings::from_args(args)?;
    let timer = Instant::now();

    let scene = Arc::new(build_scene(&settings)?);
    let mut renderer = Renderer::new(Bitmap::new(settings.width, settings.height),
                                     settings.samples_per_pixel,
                                     settings.quality_level,
                                     settings.max_ray_depth,
                                     scene.clone(),
                                     scene,
                                     settings.thread_count);
    let setup_time = timer.elapsed();

    let progress = ProgressBar::new(100);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let report_every = Duration::from_secs(settings.progress_interval);
    let mut last_report = Instant::now();
    while renderer.advance()? {
        let percent = renderer.percent_complete();
        progress.set_position(percent as u64);
        if settings.report_progress && last_report.elapsed() >= report_every {
            log::info!("Progress: {:.1}%", percent);
            last_report = Instant::now();
        }
        thread::sleep(Duration::from_millis(10));
    }
    progress.finish_and_clear();

    let elapsed = timer.elapsed();
    println!("setup_time= {:.3}", setup_time.as_secs_f64());
    println!("render_time= {:.3}", (elapsed - setup_time).as_secs_f64());
    println!("elapsed_time= {:.3}", elapsed.as_secs_f64());

    let image = renderer.read();
    write_image(&*image, &settings.output)?;
    Ok(())
}

fn build_scene(settings: &RenderSettings) -> Result<SimpleScene, AppError> {
    let mut builder = SimpleScene::builder()
        .with_environment(settings.environment_radius, settings.environment_intensity);
    let shader = builder.default_shader();

    match &settings.input {
        Some(path) => {
            log::info!("Building scene from {}.", path);
            for mesh in load_meshes_from_file(path)? {
                builder.add_mesh(mesh, shader);
            }
        }
        None => {
            log::info!("No input given, building the demo scene.");
            for mesh in demo_meshes() {
                builder.add_mesh(mesh, shader);
            }
        }
    }
    Ok(builder.build())
}

// A floor, a back wall facing the camera and two boxes, in front of a
// camera at the origin looking down +Z.
fn demo_meshes() -> Vec<Vec<tracer::shapes::triangle::Triangle>> {
    vec![
        rectangle(Vector3f::new(0.0, -1.0, 5.25), Vector3f::new(0.0, 0.0, 4.75), Vector3f::new(4.0, 0.0, 0.0)),
        rectangle(Vector3f::new(0.0, 1.5, 8.0), Vector3f::new(0.0, 2.5, 0.0), Vector3f::new(4.0, 0.0, 0.0)),
        cuboid(Vector3f::new(-1.0, -1.0, 3.5), Vector3f::new(0.5, 0.5, 5.0)),
        cuboid(Vector3f::new(1.0, -1.0, 5.0), Vector3f::new(2.2, 1.2, 6.2)),
    ]
}
