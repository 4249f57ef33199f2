// Copyright @yucwang 2021

pub mod render_threads;
pub mod renderer;
pub mod thread_bundle;
pub mod tile;
