use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::info;

use crate::error::GalleryError;
use crate::gallery::{Gallery, GalleryConfig, GalleryInner};
use crate::identity::{IdentityRecord, UNKNOWN_LABEL};

/// Dense embedding matrix file inside a gallery directory.
pub const EMBEDDINGS_FILE: &str = "embeddings.bin";
/// Row-aligned identity records inside a gallery directory.
pub const IDENTITIES_FILE: &str = "identities.jsonl";

const MATRIX_MAGIC: [u8; 4] = *b"FGAL";
const MATRIX_VERSION: u32 = 1;
const MAX_PREALLOC_FLOATS: usize = 1 << 20;

/// Row-major embedding matrix read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub dim: usize,
    pub rows: usize,
    pub data: Vec<f32>,
}

/// Writes `rows` as a dense matrix:
///
/// ```text
/// [4B magic "FGAL"] [4B version=1] [4B dim] [4B rows]
/// [rows x dim x 4B float32]
/// ```
///
/// All multi-byte values are little-endian.
pub fn write_matrix<'a>(
    w: &mut dyn Write,
    dim: usize,
    rows: impl ExactSizeIterator<Item = &'a [f32]>,
) -> Result<(), GalleryError> {
    let mut bw = BufWriter::new(w);

    let n = rows.len();
    bw.write_all(&MATRIX_MAGIC)?;
    bw.write_all(&MATRIX_VERSION.to_le_bytes())?;
    bw.write_all(&header_u32(dim, "dim")?.to_le_bytes())?;
    bw.write_all(&header_u32(n, "rows")?.to_le_bytes())?;

    for row in rows {
        if row.len() != dim {
            return Err(GalleryError::DimensionMismatch {
                expected: dim,
                got: row.len(),
            });
        }
        for &v in row {
            bw.write_all(&v.to_le_bytes())?;
        }
    }

    bw.flush()?;
    Ok(())
}

fn header_u32(n: usize, what: &str) -> Result<u32, GalleryError> {
    u32::try_from(n).map_err(|_| GalleryError::Io(format!("{what} {n} exceeds u32")))
}

/// Reads a matrix written by [`write_matrix`]. A short or malformed file is
/// `CorruptGallery`.
pub fn read_matrix(r: &mut dyn Read) -> Result<Matrix, GalleryError> {
    let mut br = BufReader::new(r);
    let (dim, rows) = read_header(&mut br)?;

    // The header is untrusted: cap the up-front reservation and let a short
    // file surface as truncation.
    let total = rows.checked_mul(dim).ok_or_else(|| {
        GalleryError::CorruptGallery(format!("matrix of {rows} x {dim} overflows"))
    })?;
    let mut data = Vec::with_capacity(total.min(MAX_PREALLOC_FLOATS));
    let mut fb = [0u8; 4];
    for _ in 0..total {
        read_exact(&mut br, &mut fb, "matrix data")?;
        data.push(f32::from_le_bytes(fb));
    }

    let mut rest = [0u8; 1];
    if br.read(&mut rest)? != 0 {
        return Err(GalleryError::CorruptGallery(format!(
            "trailing bytes after {rows} rows"
        )));
    }

    Ok(Matrix { dim, rows, data })
}

/// Reads only the matrix header and returns `(dim, rows)`.
pub fn read_matrix_header(mut r: &mut dyn Read) -> Result<(usize, usize), GalleryError> {
    read_header(&mut r)
}

fn read_header(br: &mut impl Read) -> Result<(usize, usize), GalleryError> {
    let mut magic = [0u8; 4];
    read_exact(br, &mut magic, "magic")?;
    if magic != MATRIX_MAGIC {
        return Err(GalleryError::CorruptGallery(format!(
            "invalid matrix magic {magic:?}"
        )));
    }

    let version = read_u32(br, "version")?;
    if version != MATRIX_VERSION {
        return Err(GalleryError::CorruptGallery(format!(
            "unsupported matrix version {version} (want {MATRIX_VERSION})"
        )));
    }

    let dim = read_u32(br, "dim")? as usize;
    let rows = read_u32(br, "rows")? as usize;
    if dim == 0 {
        return Err(GalleryError::CorruptGallery("matrix dimension 0".into()));
    }
    Ok((dim, rows))
}

fn read_exact(r: &mut impl Read, buf: &mut [u8], what: &str) -> Result<(), GalleryError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            GalleryError::CorruptGallery(format!("truncated matrix: missing {what}"))
        }
        _ => GalleryError::from(e),
    })
}

fn read_u32(r: &mut impl Read, what: &str) -> Result<u32, GalleryError> {
    let mut buf = [0u8; 4];
    read_exact(r, &mut buf, what)?;
    Ok(u32::from_le_bytes(buf))
}

/// Writes one JSON record per line.
pub fn write_identities(w: &mut dyn Write, records: &[IdentityRecord]) -> Result<(), GalleryError> {
    let mut bw = BufWriter::new(w);
    for rec in records {
        serde_json::to_writer(&mut bw, rec)?;
        bw.write_all(b"\n")?;
    }
    bw.flush()?;
    Ok(())
}

/// Reads records written by [`write_identities`]. Blank lines are ignored;
/// a line that does not parse is `CorruptGallery`.
pub fn read_identities(r: &mut dyn Read) -> Result<Vec<IdentityRecord>, GalleryError> {
    let br = BufReader::new(r);
    let mut records = Vec::new();
    for (lineno, line) in br.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec: IdentityRecord = serde_json::from_str(&line).map_err(|e| {
            GalleryError::CorruptGallery(format!("{IDENTITIES_FILE} line {}: {e}", lineno + 1))
        })?;
        records.push(rec);
    }
    Ok(records)
}

impl Gallery {
    /// Rebuilds a gallery from a matrix and row-aligned records.
    ///
    /// Fails with `CorruptGallery` when the row counts differ, the matrix
    /// dimension is not `cfg.dim`, or record i does not carry `index_id` i.
    /// Nothing is truncated or padded.
    pub fn from_parts(
        cfg: GalleryConfig,
        matrix: Matrix,
        records: Vec<IdentityRecord>,
    ) -> Result<Self, GalleryError> {
        if matrix.dim != cfg.dim {
            return Err(GalleryError::CorruptGallery(format!(
                "matrix dimension {} does not match configured dimension {}",
                matrix.dim, cfg.dim
            )));
        }
        if matrix.rows != records.len() {
            return Err(GalleryError::CorruptGallery(format!(
                "{} embedding rows but {} identity records",
                matrix.rows,
                records.len()
            )));
        }
        if let Some(rec) = records.iter().find(|r| r.name == UNKNOWN_LABEL) {
            return Err(GalleryError::CorruptGallery(format!(
                "identity row {} uses the reserved name {:?}",
                rec.index_id, rec.name
            )));
        }
        if let Some((i, rec)) = records.iter().enumerate().find(|(i, r)| r.index_id != *i) {
            return Err(GalleryError::CorruptGallery(format!(
                "identity row {i} carries index_id {}",
                rec.index_id
            )));
        }

        let mut index = cfg.index.build_with_capacity(cfg.dim, matrix.rows);
        for row in matrix.data.chunks_exact(cfg.dim) {
            index.append(row)?;
        }

        Ok(Gallery::from_inner(cfg, GalleryInner { index, records }))
    }

    /// Loads a gallery saved by [`Gallery::save`] from `dir`.
    pub fn open(dir: &Path, cfg: GalleryConfig) -> Result<Self, GalleryError> {
        let matrix = read_matrix(&mut File::open(dir.join(EMBEDDINGS_FILE))?)?;
        let records = read_identities(&mut File::open(dir.join(IDENTITIES_FILE))?)?;
        let g = Self::from_parts(cfg, matrix, records)?;
        info!(
            "gallery: loaded {} embeddings (dim {}) from {}",
            g.size(),
            g.dim(),
            dir.display()
        );
        Ok(g)
    }

    /// Dimension recorded in the saved matrix under `dir`, or `None` if no
    /// gallery has been saved there.
    pub fn stored_dim(dir: &Path) -> Result<Option<usize>, GalleryError> {
        let path = dir.join(EMBEDDINGS_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let (dim, _) = read_matrix_header(&mut File::open(path)?)?;
        Ok(Some(dim))
    }

    /// Loads the gallery in `dir`, or returns an empty one if the directory
    /// holds neither artifact. Exactly one artifact present is
    /// `CorruptGallery`.
    pub fn open_or_create(dir: &Path, cfg: GalleryConfig) -> Result<Self, GalleryError> {
        let has_matrix = dir.join(EMBEDDINGS_FILE).exists();
        let has_records = dir.join(IDENTITIES_FILE).exists();
        match (has_matrix, has_records) {
            (true, true) => Self::open(dir, cfg),
            (false, false) => {
                info!("gallery: starting empty gallery in {}", dir.display());
                Ok(Self::new(cfg))
            }
            (true, false) => Err(GalleryError::CorruptGallery(format!(
                "{} present without {IDENTITIES_FILE}",
                EMBEDDINGS_FILE
            ))),
            (false, true) => Err(GalleryError::CorruptGallery(format!(
                "{} present without {EMBEDDINGS_FILE}",
                IDENTITIES_FILE
            ))),
        }
    }

    /// Writes both artifacts into `dir`, creating it if needed. Each file is
    /// written to a temporary sibling and renamed into place.
    pub fn save(&self, dir: &Path) -> Result<(), GalleryError> {
        fs::create_dir_all(dir)?;
        let view = self.read();

        let size = view.size();
        let mut rows = Vec::with_capacity(size);
        for i in 0..size {
            rows.push(view.entry(i)?.0);
        }

        write_atomic(&dir.join(EMBEDDINGS_FILE), |w| {
            write_matrix(w, view.dim(), rows.iter().copied())
        })?;
        write_atomic(&dir.join(IDENTITIES_FILE), |w| {
            write_identities(w, view.records())
        })?;

        info!("gallery: saved {} embeddings to {}", size, dir.display());
        Ok(())
    }
}

fn write_atomic(
    path: &Path,
    write: impl FnOnce(&mut dyn Write) -> Result<(), GalleryError>,
) -> Result<(), GalleryError> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp)?;
        write(&mut f)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use faceid_vecstore::IndexKind;

    use super::*;

    fn cfg(dim: usize) -> GalleryConfig {
        GalleryConfig {
            dim,
            index: IndexKind::Flat,
        }
    }

    fn record(index_id: usize, name: &str) -> IdentityRecord {
        IdentityRecord {
            index_id,
            name: name.into(),
            attributes: BTreeMap::new(),
            revoked: false,
        }
    }

    #[test]
    fn matrix_layout() {
        let rows: Vec<&[f32]> = vec![&[1.0, 2.0], &[3.0, 4.0]];
        let mut buf = Vec::new();
        write_matrix(&mut buf, 2, rows.into_iter()).unwrap();

        assert_eq!(&buf[0..4], b"FGAL");
        assert_eq!(u32::from_le_bytes(buf[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(buf[8..12].try_into().unwrap()), 2);
        assert_eq!(u32::from_le_bytes(buf[12..16].try_into().unwrap()), 2);
        assert_eq!(buf.len(), 16 + 4 * 4);

        let m = read_matrix(&mut buf.as_slice()).unwrap();
        assert_eq!(m.dim, 2);
        assert_eq!(m.rows, 2);
        assert_eq!(m.data, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn matrix_rejects_bad_magic() {
        let err = read_matrix(&mut b"NOPE\x01\0\0\0".as_slice()).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn matrix_rejects_truncation() {
        let rows: Vec<&[f32]> = vec![&[1.0, 2.0, 3.0]];
        let mut buf = Vec::new();
        write_matrix(&mut buf, 3, rows.into_iter()).unwrap();
        buf.truncate(buf.len() - 2);
        let err = read_matrix(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)), "{err}");
    }

    #[test]
    fn matrix_rejects_forged_huge_header() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"FGAL");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        buf.extend_from_slice(&[0u8; 64]);

        assert!(matches!(
            read_matrix(&mut buf.as_slice()),
            Err(GalleryError::CorruptGallery(_))
        ));
    }

    #[test]
    fn from_parts_reserves_for_loaded_rows() {
        let m = Matrix {
            dim: 2,
            rows: 3,
            data: vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0],
        };
        let g = Gallery::from_parts(
            cfg(2),
            m,
            vec![record(0, "a"), record(1, "b"), record(2, "c")],
        )
        .unwrap();
        assert_eq!(g.size(), 3);
        assert_eq!(g.query(&[2.0, 2.0], 1).unwrap()[0].index_id, 2);
    }

    #[test]
    fn matrix_rejects_trailing_bytes() {
        let mut buf = Vec::new();
        write_matrix(&mut buf, 2, std::iter::empty()).unwrap();
        buf.push(0);
        assert!(matches!(
            read_matrix(&mut buf.as_slice()),
            Err(GalleryError::CorruptGallery(_))
        ));
    }

    #[test]
    fn write_matrix_rejects_ragged_rows() {
        let rows: Vec<&[f32]> = vec![&[1.0, 2.0], &[3.0]];
        let mut buf = Vec::new();
        assert!(matches!(
            write_matrix(&mut buf, 2, rows.into_iter()),
            Err(GalleryError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn identities_skip_blank_lines() {
        let text = "{\"index_id\":0,\"name\":\"a\"}\n\n{\"index_id\":1,\"name\":\"b\"}\n";
        let recs = read_identities(&mut text.as_bytes()).unwrap();
        assert_eq!(recs, vec![record(0, "a"), record(1, "b")]);
    }

    #[test]
    fn identities_reject_garbage() {
        let err = read_identities(&mut "{\"index_id\":0,\"name\":\"a\"}\nnot json\n".as_bytes())
            .unwrap_err();
        match err {
            GalleryError::CorruptGallery(msg) => assert!(msg.contains("line 2"), "{msg}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn from_parts_rejects_reserved_name() {
        let m = Matrix {
            dim: 2,
            rows: 1,
            data: vec![0.0, 0.0],
        };
        assert!(matches!(
            Gallery::from_parts(cfg(2), m, vec![record(0, "unknown")]),
            Err(GalleryError::CorruptGallery(_))
        ));
    }

    #[test]
    fn from_parts_row_count_mismatch() {
        let m = Matrix {
            dim: 2,
            rows: 2,
            data: vec![0.0; 4],
        };
        let err = Gallery::from_parts(cfg(2), m, vec![record(0, "a")]).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn from_parts_dimension_mismatch() {
        let m = Matrix {
            dim: 3,
            rows: 1,
            data: vec![0.0; 3],
        };
        let err = Gallery::from_parts(cfg(2), m, vec![record(0, "a")]).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn from_parts_misnumbered_records() {
        let m = Matrix {
            dim: 1,
            rows: 2,
            data: vec![0.0, 1.0],
        };
        let err = Gallery::from_parts(cfg(1), m, vec![record(0, "a"), record(5, "b")]).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn save_and_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gallery::with_flat_index(3);
        g.add(&[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]], &["alice", "bob"]).unwrap();
        g.revoke(1).unwrap();
        g.save(dir.path()).unwrap();

        let loaded = Gallery::open(dir.path(), cfg(3)).unwrap();
        assert_eq!(loaded.size(), 2);
        assert_eq!(loaded.get(0).unwrap(), g.get(0).unwrap());
        assert!(loaded.get(1).unwrap().1.revoked);

        // Loaded gallery keeps growing from the stored size.
        assert_eq!(loaded.add(&[&[0.0, 0.0, 1.0]], &["carol"]).unwrap(), vec![2]);
        let c = loaded.query(&[0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(c[0].index_id, 2);
    }

    #[test]
    fn open_rejects_configured_dimension_change() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gallery::with_flat_index(3);
        g.add(&[&[1.0, 0.0, 0.0]], &["alice"]).unwrap();
        g.save(dir.path()).unwrap();

        let err = Gallery::open(dir.path(), cfg(4)).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn open_rejects_extra_identity_row() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gallery::with_flat_index(2);
        g.add(&[&[1.0, 0.0]], &["alice"]).unwrap();
        g.save(dir.path()).unwrap();

        let mut f = fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join(IDENTITIES_FILE))
            .unwrap();
        writeln!(f, "{{\"index_id\":1,\"name\":\"ghost\"}}").unwrap();

        let err = Gallery::open(dir.path(), cfg(2)).unwrap_err();
        assert!(matches!(err, GalleryError::CorruptGallery(_)));
    }

    #[test]
    fn open_or_create_cases() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gallery::open_or_create(dir.path(), cfg(2)).unwrap();
        assert!(g.is_empty());

        g.add(&[&[1.0, 1.0]], &["a"]).unwrap();
        g.save(dir.path()).unwrap();
        assert_eq!(Gallery::open_or_create(dir.path(), cfg(2)).unwrap().size(), 1);

        fs::remove_file(dir.path().join(IDENTITIES_FILE)).unwrap();
        assert!(matches!(
            Gallery::open_or_create(dir.path(), cfg(2)),
            Err(GalleryError::CorruptGallery(_))
        ));
    }

    #[test]
    fn stored_dim_reads_header_only() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Gallery::stored_dim(dir.path()).unwrap(), None);

        let g = Gallery::with_flat_index(3);
        g.add(&[&[1.0, 2.0, 3.0]], &["a"]).unwrap();
        g.save(dir.path()).unwrap();
        assert_eq!(Gallery::stored_dim(dir.path()).unwrap(), Some(3));

        let mut f = File::open(dir.path().join(EMBEDDINGS_FILE)).unwrap();
        assert_eq!(read_matrix_header(&mut f).unwrap(), (3, 1));
    }

    #[test]
    fn open_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Gallery::open(&dir.path().join("nope"), cfg(2)).unwrap_err();
        assert!(matches!(err, GalleryError::Io(_)));
    }

    #[test]
    fn save_hnsw_gallery_reloads_as_flat() {
        let dir = tempfile::tempdir().unwrap();
        let g = Gallery::new(GalleryConfig {
            dim: 2,
            index: IndexKind::Hnsw {
                m: 4,
                ef_construction: 16,
                ef_search: 8,
                seed: Some(1),
            },
        });
        g.add(&[&[0.0, 0.0], &[5.0, 5.0]], &["a", "b"]).unwrap();
        g.save(dir.path()).unwrap();

        let loaded = Gallery::open(dir.path(), cfg(2)).unwrap();
        assert_eq!(loaded.index_kind(), &IndexKind::Flat);
        assert_eq!(loaded.query(&[4.0, 4.0], 1).unwrap()[0].index_id, 1);
    }
}
