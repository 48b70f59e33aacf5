use std::fs::{self, File};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use img_parts::riff::RiffContent;
use img_parts::webp::{CHUNK_EXIF, CHUNK_VP8X};
use img_parts::{Bytes, DynImage, ImageEXIF};
use tracing::debug;

use crate::error::MetadataError;
use crate::naming;

/// Tags the EXIF writer derives itself, or that point into data we drop.
const REGENERATED_TAGS: &[Tag] = &[
    Tag::ExifIFDPointer,
    Tag::GPSInfoIFDPointer,
    Tag::InteropIFDPointer,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::StripOffsets,
    Tag::StripByteCounts,
];

/// APP1-style identifier some writers put in front of the TIFF header.
const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// "EXIF metadata present" bit in the first VP8X flag byte.
const VP8X_EXIF_FLAG: u8 = 0b0000_1000;

/// The TIFF-structured EXIF block of `image`, without any `Exif\0\0` header.
fn read_exif(image: &DynImage) -> Option<Bytes> {
    match image {
        DynImage::WebP(webp) => {
            let data = webp.chunk_by_id(CHUNK_EXIF)?.content().data()?;
            if data.starts_with(EXIF_HEADER) {
                Some(data.slice(EXIF_HEADER.len()..))
            } else {
                Some(data.clone())
            }
        }
        other => other.exif(),
    }
}

/// Replace the EXIF block of `image` with `tiff`.
///
/// WebP `EXIF` chunks hold the bare TIFF structure, so the chunk written by
/// [`ImageEXIF::set_exif`] is rewritten in place and the VP8X flag raised.
fn write_exif(image: &mut DynImage, tiff: Bytes) {
    match image {
        DynImage::WebP(webp) => {
            webp.set_exif(Some(tiff.clone()));
            for chunk in webp.chunks_mut() {
                match chunk.id() {
                    CHUNK_EXIF => *chunk.content_mut() = RiffContent::Data(tiff.clone()),
                    CHUNK_VP8X => {
                        if let RiffContent::Data(data) = chunk.content_mut() {
                            let mut header = data.to_vec();
                            if let Some(flags) = header.first_mut() {
                                *flags |= VP8X_EXIF_FLAG;
                            }
                            *data = Bytes::from(header);
                        }
                    }
                    _ => {}
                }
            }
        }
        other => other.set_exif(Some(tiff)),
    }
}

/// An image container held in memory together with its editable EXIF fields.
///
/// Pixel data is never decoded; the container is re-emitted as-is with a
/// freshly encoded EXIF block.
pub struct ExifImage {
    path: PathBuf,
    image: DynImage,
    fields: Vec<Field>,
    little_endian: bool,
}

impl ExifImage {
    /// Load `path` and the primary-IFD fields of its EXIF block, if any.
    pub fn open(path: &Path) -> Result<Self, MetadataError> {
        let bytes = fs::read(path)?;
        let image = DynImage::from_bytes(bytes.into())
            .map_err(|e| MetadataError::Container(e.to_string()))?
            .ok_or_else(|| MetadataError::UnsupportedContainer(path.to_path_buf()))?;

        let (fields, little_endian) = match read_exif(&image) {
            Some(raw) => {
                let parsed = exif::Reader::new().read_raw(raw.to_vec())?;
                let fields = parsed
                    .fields()
                    .filter(|f| f.ifd_num == In::PRIMARY)
                    .filter(|f| !REGENERATED_TAGS.contains(&f.tag))
                    .filter(|f| !matches!(f.value, Value::Unknown(..)))
                    .cloned()
                    .collect();
                (fields, parsed.little_endian())
            }
            None => (Vec::new(), false),
        };

        debug!("Loaded {} ({} EXIF fields)", path.display(), fields.len());
        Ok(Self {
            path: path.to_path_buf(),
            image,
            fields,
            little_endian,
        })
    }

    fn set_ascii(&mut self, tag: Tag, text: String) {
        self.fields.retain(|f| f.tag != tag);
        self.fields.push(Field {
            tag,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.into_bytes()]),
        });
    }

    /// Set `DateTimeOriginal` to `ts`, rendered in UTC.
    pub fn set_creation_timestamp(&mut self, ts: i64) -> Result<(), MetadataError> {
        let value = naming::exif_datetime(ts).ok_or(MetadataError::InvalidTimestamp(ts))?;
        debug!("Set creation timestamp to {}", value);
        self.set_ascii(Tag::DateTimeOriginal, value);
        Ok(())
    }

    /// Set `ImageDescription`; an empty description leaves the tag alone.
    pub fn set_description(&mut self, description: &str) {
        if description.is_empty() {
            return;
        }
        debug!("Set description to {:?}", description);
        self.set_ascii(Tag::ImageDescription, description.to_string());
    }

    /// Write the image with its updated EXIF block to `dest`, keeping the source container format.
    pub fn save(self, dest: &Path) -> Result<(), MetadataError> {
        let Self {
            path,
            mut image,
            fields,
            little_endian,
        } = self;

        let mut writer = Writer::new();
        for field in &fields {
            writer.push_field(field);
        }
        let mut buf = Cursor::new(Vec::new());
        writer.write(&mut buf, little_endian)?;
        write_exif(&mut image, Bytes::from(buf.into_inner()));

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(dest)?);
        image.encoder().write_to(&mut out)?;
        out.flush()?;

        debug!("Saved {} with updated EXIF: {}", path.display(), dest.display());
        Ok(())
    }
}
