//! Binary STL output.
//!
//! ```text
//! u8[80]      header
//! u32         number of triangles
//! foreach triangle
//!     f32[3]  normal
//!     f32[3]  vertex 1
//!     f32[3]  vertex 2
//!     f32[3]  vertex 3
//!     u16     attribute byte count
//! end
//! ```
//!
//! All numbers are little-endian.

use crate::{
    mesh::{Point3, Triangle},
    ReliefError,
};
use byteorder::{LittleEndian as LE, WriteBytesExt};
use log::info;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

pub const HEADER_LEN: usize = 80;

/// Bytes per triangle record.
pub const TRIANGLE_LEN: usize = 50;

const HEADER_TEXT: &[u8] = b"binary STL from relief";

/// Writes `triangles` to `out` as binary STL.
///
/// Normals are computed from each triangle's winding.
pub fn write(triangles: &[Triangle], mut out: impl Write) -> Result<(), ReliefError> {
    let count = u32::try_from(triangles.len()).map_err(|_| {
        ReliefError::InvalidInput(format!(
            "{} triangles exceed the STL limit of {}",
            triangles.len(),
            u32::MAX
        ))
    })?;

    let mut header = [b' '; HEADER_LEN];
    header[..HEADER_TEXT.len()].copy_from_slice(HEADER_TEXT);
    out.write_all(&header)?;
    out.write_u32::<LE>(count)?;

    for triangle in triangles {
        write_point(&mut out, triangle.normal())?;
        for vertex in triangle.0 {
            write_point(&mut out, vertex)?;
        }
        out.write_u16::<LE>(0)?;
    }
    out.flush()?;
    Ok(())
}

/// Writes `triangles` to the file at `path`.
///
/// Output goes to a temporary file next to `path` that is renamed
/// into place once complete.
pub fn save<P: AsRef<Path>>(triangles: &[Triangle], path: P) -> Result<(), ReliefError> {
    let path = path.as_ref();
    let tmp_path = {
        let mut p = path.to_owned();
        p.set_extension("stl.tmp");
        p
    };

    let result = File::create(&tmp_path)
        .map_err(ReliefError::from)
        .and_then(|file| write(triangles, BufWriter::new(file)));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    fs::rename(&tmp_path, path)?;

    info!(
        "wrote {} triangles to {}",
        triangles.len(),
        path.display()
    );
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn write_point(out: &mut impl Write, p: Point3) -> std::io::Result<()> {
    out.write_f32::<LE>(p.x as f32)?;
    out.write_f32::<LE>(p.y as f32)?;
    out.write_f32::<LE>(p.z as f32)
}

#[cfg(test)]
mod tests {
    use super::{save, write, HEADER_LEN, TRIANGLE_LEN};
    use crate::mesh::{Point3, Triangle};
    use byteorder::{LittleEndian as LE, ReadBytesExt};

    fn triangles() -> Vec<Triangle> {
        vec![
            Triangle([
                Point3::new(0.0, 0.0, 3.0),
                Point3::new(1.0, 0.0, 3.0),
                Point3::new(0.0, 1.0, 3.0),
            ]),
            Triangle([
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
            ]),
        ]
    }

    fn read_point(rdr: &mut &[u8]) -> [f32; 3] {
        [
            rdr.read_f32::<LE>().unwrap(),
            rdr.read_f32::<LE>().unwrap(),
            rdr.read_f32::<LE>().unwrap(),
        ]
    }

    #[test]
    fn test_layout() {
        let mut buf = Vec::new();
        write(&triangles(), &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 4 + 2 * TRIANGLE_LEN);
        assert!(!buf.starts_with(b"solid"));

        let rdr = &mut &buf[HEADER_LEN..];
        assert_eq!(rdr.read_u32::<LE>().unwrap(), 2);

        assert_eq!(read_point(rdr), [0.0, 0.0, 1.0]);
        assert_eq!(read_point(rdr), [0.0, 0.0, 3.0]);
        assert_eq!(read_point(rdr), [1.0, 0.0, 3.0]);
        assert_eq!(read_point(rdr), [0.0, 1.0, 3.0]);
        assert_eq!(rdr.read_u16::<LE>().unwrap(), 0);

        assert_eq!(read_point(rdr), [0.0, 0.0, -1.0]);
        assert_eq!(read_point(rdr), [0.0, 0.0, 0.0]);
        assert_eq!(read_point(rdr), [0.0, 1.0, 0.0]);
        assert_eq!(read_point(rdr), [1.0, 0.0, 0.0]);
        assert_eq!(rdr.read_u16::<LE>().unwrap(), 0);
        assert!(rdr.is_empty());
    }

    #[test]
    fn test_empty() {
        let mut buf = Vec::new();
        write(&[], &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 4);
        assert_eq!((&mut &buf[HEADER_LEN..]).read_u32::<LE>().unwrap(), 0);
    }

    #[test]
    fn test_save() {
        let dir = std::env::temp_dir().join(format!("relief-stl-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("terrain.stl");
        save(&triangles(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let mut expected = Vec::new();
        write(&triangles(), &mut expected).unwrap();
        assert_eq!(bytes, expected);
        assert!(!dir.join("terrain.stl.tmp").exists());
    }

    #[test]
    fn test_save_to_missing_dir() {
        let path = std::env::temp_dir()
            .join(format!("relief-missing-{}", std::process::id()))
            .join("nested")
            .join("terrain.stl");
        assert!(save(&triangles(), &path).is_err());
        assert!(!path.exists());
    }
}
