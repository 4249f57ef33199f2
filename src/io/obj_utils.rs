use std::fs;
use std::path::Path;

use crate::math::constants::{ Float, Vector3f };
use crate::shapes::triangle::Triangle;

use wavefront_obj::{obj, ParseError};
use std::fmt;

#[derive(Debug)]
pub enum ObjLoadError {
    Io(std::io::Error),
    Parse(ParseError),
    VertexOutOfRange { object: String, index: usize },
}

impl From<std::io::Error> for ObjLoadError {
    fn from(err: std::io::Error) -> Self {
        ObjLoadError::Io(err)
    }
}

impl From<ParseError> for ObjLoadError {
    fn from(err: ParseError) -> Self {
        ObjLoadError::Parse(err)
    }
}

impl fmt::Display for ObjLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjLoadError::Io(err) => write!(f, "io error: {}", err),
            ObjLoadError::Parse(err) => write!(f, "parse error: {}", err),
            ObjLoadError::VertexOutOfRange { object, index } =>
                write!(f, "object {} references missing vertex {}", object, index),
        }
    }
}

impl std::error::Error for ObjLoadError {}

/// One triangle mesh per object in the file. Points and lines are skipped.
pub fn load_meshes_from_str<S: AsRef<str>>(input: S) -> Result<Vec<Vec<Triangle>>, ObjLoadError> {
    let obj_set = load_obj_from_str(input)?;
    let mut meshes = Vec::with_capacity(obj_set.objects.len());

    for object in &obj_set.objects {
        let vertex = |index: usize| -> Result<Vector3f, ObjLoadError> {
            object.vertices.get(index)
                .map(|v| Vector3f::new(v.x as Float, v.y as Float, v.z as Float))
                .ok_or_else(|| ObjLoadError::VertexOutOfRange { object: object.name.clone(), index })
        };

        let mut triangles = Vec::new();
        for geometry in &object.geometry {
            for shape in &geometry.shapes {
                if let obj::Primitive::Triangle(a, b, c) = shape.primitive {
                    triangles.push(Triangle::new(vertex(a.0)?, vertex(b.0)?, vertex(c.0)?));
                }
            }
        }

        log::info!("Loaded object {}: {} vertices, {} triangles.",
                   object.name, object.vertices.len(), triangles.len());
        if !triangles.is_empty() {
            meshes.push(triangles);
        }
    }
    Ok(meshes)
}

pub fn load_meshes_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Triangle>>, ObjLoadError> {
    let data = fs::read_to_string(path)?;
    load_meshes_from_str(data)
}

pub fn load_obj_from_str<S: AsRef<str>>(input: S) -> Result<obj::ObjSet, ParseError> {
    let triangulated = triangulate_faces(input.as_ref());
    obj::parse(triangulated)
}

// Fans polygons with more than three corners around their first vertex.
fn triangulate_faces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 4);
    for line in input.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("f ") || trimmed.starts_with("f\t") {
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() > 4 {
                let base = parts[1];
                for i in 2..(parts.len() - 1) {
                    out.push_str("f ");
                    out.push_str(base);
                    out.push(' ');
                    out.push_str(parts[i]);
                    out.push(' ');
                    out.push_str(parts[i + 1]);
                    out.push('\n');
                }
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
