//! STL triangle-mesh codec
//!
//! Reads both STL variants into the shared [`TriangleMesh`] representation
//! and writes the ASCII variant. Format detection follows the first
//! trimmed line: a case-insensitive `solid` prefix selects the ASCII
//! parser, anything else the fixed binary layout (80-byte header, u32
//! little-endian triangle count, 50-byte records). ASCII-loaded triangles
//! are appended densely, three fresh vertices per facet, with the facet
//! normal repeated per vertex.

use crate::{MeshReader, MeshWriter};
use byteorder::{LittleEndian, ReadBytesExt};
use cloudmesh_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

/// Bytes per binary triangle record: normal + 3 vertices + attribute count.
const BINARY_RECORD_SIZE: usize = 50;

/// Bytes before the first binary record: header + triangle count.
const BINARY_PRELUDE_SIZE: usize = 84;

/// STL file reader
pub struct StlReader;

/// STL file writer (ASCII only)
pub struct StlWriter;

impl MeshReader for StlReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;

        if looks_like_ascii(&bytes) {
            parse_ascii(&String::from_utf8_lossy(&bytes))
        } else {
            parse_binary(&bytes)
        }
    }
}

impl MeshWriter for StlWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        StlWriter::write_mesh_ascii(mesh, path, "cloudmesh")
    }
}

impl StlWriter {
    /// Write `mesh` as ASCII STL, one facet block per triangle with six
    /// decimal digits per coordinate.
    ///
    /// Facet normals come from the mesh's vertex normals when present
    /// (dense ASCII meshes carry the facet normal on each vertex);
    /// otherwise they are derived from the edge cross product at write
    /// time.
    pub fn write_mesh_ascii<P: AsRef<Path>>(
        mesh: &TriangleMesh,
        path: P,
        name: &str,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        let mut w = BufWriter::new(file);

        writeln!(w, "solid {name}")?;
        for face in &mesh.faces {
            let n = mesh
                .normals
                .as_ref()
                .map(|ns| ns[face[0]])
                .filter(|n| n.magnitude() > 1e-12)
                .unwrap_or_else(|| mesh.face_normal(face));

            writeln!(w, "  facet normal {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
            writeln!(w, "    outer loop")?;
            for &vi in face {
                let v = mesh.vertices[vi];
                writeln!(w, "      vertex {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
            }
            writeln!(w, "    endloop")?;
            writeln!(w, "  endfacet")?;
        }
        writeln!(w, "endsolid {name}")?;
        w.flush()?;
        Ok(())
    }
}

fn looks_like_ascii(bytes: &[u8]) -> bool {
    let first_line = bytes.split(|&b| b == b'\n').next().unwrap_or(&[]);
    String::from_utf8_lossy(first_line)
        .trim()
        .to_ascii_lowercase()
        .starts_with("solid")
}

fn codec_error(location: String, message: impl Into<String>) -> Error {
    Error::CodecFormat {
        location,
        message: message.into(),
    }
}

fn parse_floats<'a, I: Iterator<Item = &'a str>>(
    tokens: I,
    line_no: usize,
) -> Result<[f32; 3]> {
    let mut out = [0.0f32; 3];
    let mut count = 0;
    for token in tokens {
        if count == 3 {
            return Err(codec_error(
                format!("line {line_no}"),
                "expected exactly 3 coordinates",
            ));
        }
        out[count] = token
            .parse()
            .map_err(|_| codec_error(format!("line {line_no}"), format!("bad float '{token}'")))?;
        count += 1;
    }
    if count != 3 {
        return Err(codec_error(
            format!("line {line_no}"),
            "expected exactly 3 coordinates",
        ));
    }
    Ok(out)
}

fn parse_ascii(text: &str) -> Result<TriangleMesh> {
    let mut vertices: Vec<Point3f> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();
    let mut normals: Vec<Vector3f> = Vec::new();

    let mut facet_normal = Vector3f::zeros();
    let mut facet_vertices: Vec<Point3f> = Vec::with_capacity(3);
    let mut in_facet = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let keyword = tokens.next().unwrap_or("").to_ascii_lowercase();
        match keyword.as_str() {
            "solid" => {}
            "facet" => {
                if tokens.next().map(str::to_ascii_lowercase).as_deref() != Some("normal") {
                    return Err(codec_error(
                        format!("line {line_no}"),
                        "expected 'facet normal'",
                    ));
                }
                let [nx, ny, nz] = parse_floats(tokens, line_no)?;
                facet_normal = Vector3f::new(nx, ny, nz);
                facet_vertices.clear();
                in_facet = true;
            }
            "outer" => {}
            "vertex" => {
                if !in_facet || facet_vertices.len() == 3 {
                    return Err(codec_error(
                        format!("line {line_no}"),
                        "vertex outside a 3-vertex facet loop",
                    ));
                }
                let [x, y, z] = parse_floats(tokens, line_no)?;
                facet_vertices.push(Point3f::new(x, y, z));
            }
            "endloop" => {
                if facet_vertices.len() != 3 {
                    return Err(codec_error(
                        format!("line {line_no}"),
                        format!("facet loop has {} vertices, need 3", facet_vertices.len()),
                    ));
                }
            }
            "endfacet" => {
                if !in_facet || facet_vertices.len() != 3 {
                    return Err(codec_error(
                        format!("line {line_no}"),
                        "endfacet without a complete facet",
                    ));
                }
                let base = vertices.len();
                vertices.extend_from_slice(&facet_vertices);
                faces.push([base, base + 1, base + 2]);
                normals.extend(std::iter::repeat(facet_normal).take(3));
                in_facet = false;
            }
            "endsolid" => break,
            other => {
                return Err(codec_error(
                    format!("line {line_no}"),
                    format!("unexpected token '{other}'"),
                ));
            }
        }
    }

    if in_facet {
        return Err(codec_error(
            "end of file".to_string(),
            "unterminated facet block",
        ));
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    mesh.set_normals(normals);
    Ok(mesh)
}

fn parse_binary(bytes: &[u8]) -> Result<TriangleMesh> {
    if bytes.len() < BINARY_PRELUDE_SIZE {
        return Err(codec_error(
            format!("offset {}", bytes.len()),
            "file too small for 80-byte header and triangle count",
        ));
    }

    let mut cursor = Cursor::new(bytes);
    cursor.set_position(80);
    let triangle_count = cursor.read_u32::<LittleEndian>()? as usize;

    let expected = BINARY_PRELUDE_SIZE + triangle_count * BINARY_RECORD_SIZE;
    if bytes.len() < expected {
        return Err(codec_error(
            format!("offset {}", bytes.len()),
            format!("truncated: {triangle_count} triangles need {expected} bytes"),
        ));
    }

    let mut vertices = Vec::with_capacity(triangle_count * 3);
    let mut faces = Vec::with_capacity(triangle_count);
    let mut normals = Vec::with_capacity(triangle_count * 3);

    for i in 0..triangle_count {
        let normal = read_vector3(&mut cursor)?;
        let base = i * 3;
        for _ in 0..3 {
            vertices.push(Point3f::from(read_vector3(&mut cursor)?));
            normals.push(normal);
        }
        faces.push([base, base + 1, base + 2]);
        // 2-byte attribute field, discarded.
        cursor.read_u16::<LittleEndian>()?;
    }

    let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
    mesh.set_normals(normals);
    Ok(mesh)
}

fn read_vector3(cursor: &mut Cursor<&[u8]>) -> Result<Vector3f> {
    Ok(Vector3f::new(
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
        cursor.read_f32::<LittleEndian>()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    fn sample_mesh() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(1.0, 1.0, 1.0),
            ],
            vec![[0, 1, 2], [1, 3, 2]],
        )
    }

    fn write_binary_stl(path: &Path, triangles: &[([f32; 3], [[f32; 3]; 3])]) {
        let mut bytes: Vec<u8> = vec![0u8; 80];
        bytes
            .write_u32::<LittleEndian>(triangles.len() as u32)
            .unwrap();
        for (normal, verts) in triangles {
            for &c in normal {
                bytes.write_f32::<LittleEndian>(c).unwrap();
            }
            for v in verts {
                for &c in v {
                    bytes.write_f32::<LittleEndian>(c).unwrap();
                }
            }
            bytes.write_u16::<LittleEndian>(0xBEEF).unwrap();
        }
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_ascii_round_trip() {
        let path = temp_path("cloudmesh_roundtrip.stl");
        let mesh = sample_mesh();

        StlWriter::write_mesh_ascii(&mesh, &path, "roundtrip").unwrap();
        let loaded = StlReader::read_mesh(&path).unwrap();

        assert_eq!(loaded.face_count(), mesh.face_count());
        // Vertices are densified on read: 3 per triangle.
        assert_eq!(loaded.vertex_count(), mesh.face_count() * 3);

        for (fi, face) in mesh.faces.iter().enumerate() {
            let expected_normal = mesh.face_normal(face);
            for (k, &vi) in face.iter().enumerate() {
                let original = mesh.vertices[vi];
                let loaded_v = loaded.vertices[loaded.faces[fi][k]];
                assert!((original.x - loaded_v.x).abs() < 1e-5);
                assert!((original.y - loaded_v.y).abs() < 1e-5);
                assert!((original.z - loaded_v.z).abs() < 1e-5);

                let loaded_n = loaded.normals.as_ref().unwrap()[loaded.faces[fi][k]];
                assert!((expected_normal - loaded_n).magnitude() < 1e-5);
            }
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_ascii_written_normals_preserved() {
        // A mesh that already carries normals writes them verbatim and
        // reads them back.
        let path = temp_path("cloudmesh_normals.stl");
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.set_normals(vec![Vector3f::new(0.0, 0.0, 1.0); 3]);

        StlWriter::write_mesh_ascii(&mesh, &path, "n").unwrap();
        let loaded = StlReader::read_mesh(&path).unwrap();
        let n = loaded.normals.as_ref().unwrap()[0];
        assert!((n - Vector3f::new(0.0, 0.0, 1.0)).magnitude() < 1e-6);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_binary_read() {
        let path = temp_path("cloudmesh_binary.stl");
        write_binary_stl(
            &path,
            &[
                (
                    [0.0, 0.0, 1.0],
                    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                ),
                (
                    [0.0, 0.0, -1.0],
                    [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
                ),
            ],
        );

        let mesh = StlReader::read_mesh(&path).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.vertices[1], Point3f::new(1.0, 0.0, 0.0));
        let n = mesh.normals.as_ref().unwrap()[3];
        assert_eq!(n, Vector3f::new(0.0, 0.0, -1.0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_detection_by_solid_prefix() {
        // Uppercase SOLID still selects the ASCII parser.
        let path = temp_path("cloudmesh_upper.stl");
        std::fs::write(
            &path,
            "SOLID shouty\n  facet normal 0 0 1\n    outer loop\n      vertex 0 0 0\n      vertex 1 0 0\n      vertex 0 1 0\n    endloop\n  endfacet\nendsolid shouty\n",
        )
        .unwrap();

        let mesh = StlReader::read_mesh(&path).unwrap();
        assert_eq!(mesh.face_count(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_truncated_binary_is_codec_error() {
        let path = temp_path("cloudmesh_truncated.stl");
        let mut bytes = vec![0u8; 80];
        bytes.write_u32::<LittleEndian>(5).unwrap();
        bytes.extend_from_slice(&[0u8; 40]); // far short of 5 * 50
        std::fs::write(&path, bytes).unwrap();

        let result = StlReader::read_mesh(&path);
        assert!(matches!(result, Err(Error::CodecFormat { .. })));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_malformed_ascii_reports_line() {
        let path = temp_path("cloudmesh_malformed.stl");
        std::fs::write(
            &path,
            "solid bad\n  facet normal 0 0 1\n    outer loop\n      vertex 0 0 zero\n",
        )
        .unwrap();

        match StlReader::read_mesh(&path) {
            Err(Error::CodecFormat { location, .. }) => assert_eq!(location, "line 4"),
            other => panic!("expected CodecFormat, got {other:?}"),
        }

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_file_access() {
        let result = StlReader::read_mesh("/nonexistent/cloudmesh.stl");
        assert!(matches!(result, Err(Error::FileAccess { .. })));
    }
}
