use bzip2::Compression as BzLevel;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::Compression as GzLevel;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bzip2,
}

impl Compression {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gz" => Some(Self::Gzip),
            "bz2" => Some(Self::Bzip2),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("Filename does not have an extension. Could not determine fileformat.")]
    NoExtension,
}

/// File format derived from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFormat {
    /// Format extension, e.g. `xyz` for both `a.xyz` and `a.xyz.gz`.
    pub extension: String,
    pub compression: Compression,
}

/// Splits a filename into format extension and compression layer.
///
/// A trailing `.gz` or `.bz2` selects compression; the extension before it
/// names the format.
pub fn resolve_format(filename: &str) -> Result<FileFormat, FormatError> {
    let last_dot = filename.rfind('.').ok_or(FormatError::NoExtension)?;
    let last = &filename[last_dot + 1..];
    let (extension, compression) = match Compression::from_suffix(last) {
        Some(compression) => {
            let stem = &filename[..last_dot];
            let dot = stem.rfind('.').ok_or(FormatError::NoExtension)?;
            (&stem[dot + 1..], compression)
        }
        None => (last, Compression::None),
    };
    if extension.is_empty() || extension.contains(['/', '\\']) {
        return Err(FormatError::NoExtension);
    }
    Ok(FileFormat {
        extension: extension.to_string(),
        compression,
    })
}

/// Opens `path` for reading through the requested compression layer.
pub fn open_reader(path: &Path, compression: Compression) -> io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    match compression {
        Compression::None => Ok(Box::new(BufReader::new(file))),
        Compression::Gzip => Ok(Box::new(BufReader::new(GzDecoder::new(file)))),
        Compression::Bzip2 => Ok(Box::new(BufReader::new(BzDecoder::new(file)))),
    }
}

/// Output file with an optional gzip or bzip2 layer. Call
/// [`finish`](Self::finish) to flush the trailer; dropping it loses write
/// errors.
pub enum CompressedWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Bzip2(BzEncoder<BufWriter<File>>),
}

impl CompressedWriter {
    /// `level` is the gzip scale `0..=9`; bzip2 block sizes start at 1.
    pub fn create(path: &Path, compression: Compression, level: u32) -> io::Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(match compression {
            Compression::None => Self::Plain(file),
            Compression::Gzip => Self::Gzip(GzEncoder::new(file, GzLevel::new(level.min(9)))),
            Compression::Bzip2 => Self::Bzip2(BzEncoder::new(file, BzLevel::new(level.clamp(1, 9)))),
        })
    }

    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::Plain(mut w) => w.flush(),
            Self::Gzip(enc) => enc.finish()?.flush(),
            Self::Bzip2(enc) => enc.finish()?.flush(),
        }
    }
}

impl Write for CompressedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(w) => w.write(buf),
            Self::Bzip2(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(w) => w.flush(),
            Self::Bzip2(w) => w.flush(),
        }
    }
}
