// Copyright @yucwang 2021

pub mod computation_node;
pub mod image;
pub mod integrator;
pub mod kdtree;
pub mod provider;
pub mod rng;
pub mod scene;
pub mod shade_stack;
pub mod shader;
pub mod shape;
pub mod tangent_frame;
pub mod trace_result;
