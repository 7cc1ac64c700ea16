//! A minimal Wavefront OBJ loader: line-type dispatch over `v`/`vn`/`f`, with best-effort
//! `vtx/tex/nrm` index parsing (vertex index taken first) via plain `split_whitespace` rather
//! than a regex pass. This is glue for `bin/demo.rs` and test fixtures, not a general-purpose
//! asset pipeline.

use crate::core::geometry::Point3f;
use crate::core::error::RenderError;

/// A loaded mesh, already triangulated: `faces` are ready for `Scene::add_mesh`.
pub struct ObjData {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[u32; 3]>,
}

/// The first `/`-delimited index of an `f` token is always the vertex index.
fn parse_face_vertex(token: &str) -> Result<u32, RenderError> {
    let vertex_field = token.split('/').next().unwrap_or(token);
    vertex_field
        .parse::<i64>()
        .map_err(|_| RenderError::Configuration(format!("malformed face index: {}", token)))
        .map(|i| (i - 1) as u32)
}

/// Parses an OBJ document already read into memory. `v x y z [w]` (`w` ignored), `vn x y z`
///, `f a b c [d]` with quads triangulated
/// as `(a, b, c)` + `(a, c, d)`. Unknown directives
/// (`vt`, `g`, `o`, `#`, ...) are skipped.
pub fn parse(source: &str) -> Result<ObjData, RenderError> {
    let mut vertices = Vec::new();
    let mut faces = Vec::new();

    for line in source.lines() {
        let mut tokens = line.split_whitespace();
        let directive = match tokens.next() {
            Some(d) => d,
            None => continue,
        };
        match directive {
            "v" => {
                let coords: Vec<&str> = tokens.collect();
                if coords.len() < 3 {
                    return Err(RenderError::Configuration(format!("malformed vertex line: {}", line)));
                }
                let parse_f = |s: &str| {
                    s.parse::<f32>()
                        .map_err(|_| RenderError::Configuration(format!("malformed vertex line: {}", line)))
                };
                let x = parse_f(coords[0])?;
                let y = parse_f(coords[1])?;
                let z = parse_f(coords[2])?;
                vertices.push(Point3f::new(x, y, z));
            }
            "vn" => {
                // Recomputed from triangle winding at mesh-build time; not retained.
            }
            "f" => {
                let indices: Vec<u32> = tokens
                    .map(parse_face_vertex)
                    .collect::<Result<_, _>>()?;
                match indices.len() {
                    3 => faces.push([indices[0], indices[1], indices[2]]),
                    4 => {
                        faces.push([indices[0], indices[1], indices[2]]);
                        faces.push([indices[0], indices[2], indices[3]]);
                    }
                    _ => {
                        return Err(RenderError::Configuration(format!(
                            "face with {} vertices not supported: {}",
                            indices.len(),
                            line
                        )))
                    }
                }
            }
            _ => {}
        }
    }

    Ok(ObjData { vertices, faces })
}

pub fn load(path: &str) -> Result<ObjData, RenderError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| RenderError::Configuration(format!("{}: {}", path, e)))?;
    parse(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_triangle() {
        let obj = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(obj.vertices.len(), 3);
        assert_eq!(obj.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn triangulates_a_quad() {
        let obj = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();
        assert_eq!(obj.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn parses_vertex_texture_normal_faces_taking_only_the_vertex_index() {
        let obj = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n").unwrap();
        assert_eq!(obj.faces, vec![[0, 1, 2]]);
    }

    #[test]
    fn ignores_comments_and_unknown_directives() {
        let obj = parse("# a comment\no MyObject\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1 2 3\n").unwrap();
        assert_eq!(obj.vertices.len(), 3);
        assert_eq!(obj.faces.len(), 1);
    }

    #[test]
    fn rejects_a_malformed_vertex_line() {
        assert!(parse("v not a number\n").is_err());
    }
}
